use std::error::Error;

use regtable::runner::{ListingKind, ListingSource, Options, Runner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        source: ListingSource::FilePath("./demos/tags.json".to_string()),
        kind: ListingKind::Tags,
        vulns_url: Some("https://r.example.com".to_string()),
        rate: 5,
        concurrency: 5,
        timeout_seconds: 5,
        ..Options::default()
    })?;
    let report = runner.run().await?;

    println!("Counts applied: {}", report.counts_applied);
    for key in report.count_misses.iter() {
        println!("no row for {}", key);
    }
    for failure in report.count_failures.iter() {
        println!("fetch failed: {}", failure);
    }

    Ok(())
}
