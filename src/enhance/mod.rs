use crate::filter::{compute_visibility, FilterError};
use crate::listing::Listing;

/// Page behaviors applied to a freshly built listing.
#[derive(Clone, Debug)]
pub struct EnhanceOptions {
    pub query: String,
    pub mark_parent: bool,
    pub rewrite_links: bool,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            mark_parent: true,
            rewrite_links: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EnhanceReport {
    pub visibility: Vec<bool>,
    pub parent_marked: bool,
    pub links_rewritten: usize,
}

/// Runs the behaviors in page order: parent classification, link cleanup,
/// then the name filter. Visibility is returned rather than applied; the
/// presentation layer decides how hidden rows are treated.
pub fn enhance(listing: &mut Listing, options: &EnhanceOptions) -> Result<EnhanceReport, FilterError> {
    let parent_marked = options.mark_parent && listing.mark_parent_row();
    let links_rewritten = if options.rewrite_links {
        listing.rewrite_links()
    } else {
        0
    };
    let visibility = compute_visibility(listing, &options.query)?;
    Ok(EnhanceReport {
        visibility,
        parent_marked,
        links_rewritten,
    })
}
