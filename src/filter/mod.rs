use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::listing::{Listing, NAME_CELL};

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn tag_pattern() -> &'static Regex {
    TAG_PATTERN.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

/// Removes markup, leaving the text a browser would render for the cell.
pub fn strip_tags(value: &str) -> String {
    tag_pattern().replace_all(value, "").into_owned()
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("row {row} has no name cell at column {column}")]
    MissingNameCell { row: usize, column: usize },
}

/// Case-insensitive substring match over the rendered name cells. Row 0 is
/// the header and always stays visible; every other row must carry a name
/// cell or the whole pass fails.
pub fn compute_visibility(listing: &Listing, query: &str) -> Result<Vec<bool>, FilterError> {
    let needle = query.to_lowercase();
    let mut visible = Vec::with_capacity(listing.rows().len());
    for (index, row) in listing.rows().iter().enumerate() {
        if index == 0 {
            visible.push(true);
            continue;
        }
        let cell = row.cells.get(NAME_CELL).ok_or(FilterError::MissingNameCell {
            row: index,
            column: NAME_CELL,
        })?;
        let text = strip_tags(cell).to_lowercase();
        visible.push(text.contains(needle.as_str()));
    }
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Row;

    fn listing_with_names(names: &[&str]) -> Listing {
        let mut listing = Listing::new(
            "r.example.com",
            vec!["".to_string(), "Name".to_string(), "Last Modified".to_string()],
        );
        for name in names {
            listing.push_row(Row {
                id: None,
                class: None,
                cells: vec![
                    String::new(),
                    format!(r#"<a href="repo/{name}/tags.html">{name}</a>"#),
                    String::new(),
                ],
            });
        }
        listing
    }

    #[test]
    fn strip_tags_removes_markup() {
        assert_eq!(strip_tags("<a href=\"x.html\">alpine</a>"), "alpine");
        assert_eq!(strip_tags("<b><i>deep</i></b>"), "deep");
        assert_eq!(strip_tags("plain"), "plain");
    }

    #[test]
    fn empty_query_keeps_every_row() {
        let listing = listing_with_names(&["alpine", "nginx"]);
        let visible = compute_visibility(&listing, "").unwrap();
        assert_eq!(visible, vec![true, true, true]);
    }

    #[test]
    fn query_matches_case_insensitively() {
        let listing = listing_with_names(&["Alpine", "nginx", "alpine-nightly"]);
        let visible = compute_visibility(&listing, "ALPINE").unwrap();
        assert_eq!(visible, vec![true, true, false, true]);
    }

    #[test]
    fn query_ignores_markup_attributes() {
        let listing = listing_with_names(&["alpine"]);
        // "href" only appears inside the anchor tag, never in rendered text
        let visible = compute_visibility(&listing, "href").unwrap();
        assert_eq!(visible, vec![true, false]);
    }

    #[test]
    fn header_row_survives_a_query_with_no_matches() {
        let listing = listing_with_names(&["alpine", "nginx"]);
        let visible = compute_visibility(&listing, "postgres").unwrap();
        assert_eq!(visible, vec![true, false, false]);
    }

    #[test]
    fn repeated_queries_agree() {
        let listing = listing_with_names(&["alpine", "nginx", "postgres"]);
        let first = compute_visibility(&listing, "gres").unwrap();
        let second = compute_visibility(&listing, "gres").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rows_without_a_name_cell_fail() {
        let mut listing = listing_with_names(&["alpine"]);
        listing.push_row(Row {
            id: None,
            class: None,
            cells: vec![String::new()],
        });
        let err = compute_visibility(&listing, "").unwrap_err();
        assert!(matches!(err, FilterError::MissingNameCell { row: 2, column: 1 }));
    }
}
