use std::error::Error;

use regtable::filter::strip_tags;
use regtable::listing::{RegistryListing, RepositoryEntry, NAME_CELL};
use regtable::runner::{ListingKind, ListingSource, Options, Runner};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let data = RegistryListing {
        registry_domain: "r.example.com".to_string(),
        name: "alpine".to_string(),
        last_updated: "2023-06-15T00:00:00Z".to_string(),
        has_vulns: false,
        repositories: vec![
            RepositoryEntry {
                name: "alpine".to_string(),
                tag: "3.18".to_string(),
                created: "2023-06-05T12:00:00Z".to_string(),
                uri: "r.example.com/alpine:3.18".to_string(),
            },
            RepositoryEntry {
                name: "alpine".to_string(),
                tag: "edge".to_string(),
                created: "2023-06-14T09:30:00Z".to_string(),
                uri: "r.example.com/alpine:edge".to_string(),
            },
        ],
    };

    let runner = Runner::new(Options {
        source: ListingSource::Inline(data),
        kind: ListingKind::Tags,
        ..Options::default()
    })?;
    let report = runner.run().await?;

    for (row, age) in report.listing.rows().iter().zip(report.ages.iter()).skip(1) {
        println!("{} {}", strip_tags(&row.cells[NAME_CELL]), age.as_deref().unwrap_or("-"));
    }

    Ok(())
}
