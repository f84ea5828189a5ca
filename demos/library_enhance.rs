use std::error::Error;

use regtable::output;
use regtable::runner::{ListingKind, ListingSource, Options, Runner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        source: ListingSource::FilePath("./demos/tags.json".to_string()),
        kind: ListingKind::Tags,
        query: "edge".to_string(),
        ..Options::default()
    })?;
    let report = runner.run().await?;

    println!("Rows: {}", report.listing.rows().len() - 1);
    println!("Links rewritten: {}", report.links_rewritten);

    let document = output::build_document(&report.listing, &report.visibility, &report.ages);
    print!("{}", String::from_utf8_lossy(&output::render_text(&document)));

    Ok(())
}
