use chrono::{DateTime, TimeZone, Utc};

use crate::listing::{RegistryListing, RepositoryEntry, NAME_CELL};
use crate::output;
use crate::runner::{ListingKind, ListingSource, Options, Runner, RunnerError};

fn alpine_listing() -> RegistryListing {
    RegistryListing {
        registry_domain: "r.example.com".to_string(),
        name: "alpine".to_string(),
        last_updated: "2023-06-15T00:00:00Z".to_string(),
        has_vulns: true,
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
    }
}

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn tags_run_applies_every_page_behavior() {
    let runner = Runner::new(Options {
        source: ListingSource::Inline(alpine_listing()),
        kind: ListingKind::Tags,
        query: "edge".to_string(),
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();

    let report = runner.run().await.unwrap();
    assert_eq!(report.visibility, vec![true, false, false, true]);
    assert!(report.parent_marked);
    assert_eq!(report.links_rewritten, 3);
    assert_eq!(report.counts_applied, 0);
    assert_eq!(report.listing.rows()[1].class.as_deref(), Some("parent"));
    assert!(report.listing.rows()[1].cells[NAME_CELL].contains(r#"href="../index""#));
    assert_eq!(report.listing.rows()[3].id.as_deref(), Some("alpine:edge"));
    assert_eq!(report.ages[1], None);
    assert_eq!(report.ages[2].as_deref(), Some("2 weeks ago"));
    assert_eq!(report.ages[3].as_deref(), Some("Yesterday"));
}

#[tokio::test]
async fn repositories_run_links_without_a_parent_row() {
    let runner = Runner::new(Options {
        source: ListingSource::Inline(alpine_listing()),
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();

    let report = runner.run().await.unwrap();
    assert_eq!(report.listing.rows().len(), 3);
    assert_eq!(report.visibility, vec![true, true, true]);
    assert!(!report.parent_marked);
    assert_eq!(report.links_rewritten, 2);
    assert!(report.listing.rows()[1].cells[NAME_CELL].contains(r#"href="repo/alpine/tags""#));
    assert_eq!(report.ages[1].as_deref(), Some("2 weeks ago"));
    assert_eq!(report.ages[2].as_deref(), Some("Yesterday"));
}

#[tokio::test]
async fn file_sources_round_trip_through_serde() {
    let path = std::env::temp_dir().join(format!("regtable-tags-{}.json", std::process::id()));
    let raw = serde_json::to_string(&alpine_listing()).unwrap();
    tokio::fs::write(&path, raw).await.unwrap();

    let runner = Runner::new(Options {
        source: ListingSource::FilePath(path.to_string_lossy().into_owned()),
        kind: ListingKind::Tags,
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();
    let report = runner.run().await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    assert_eq!(report.listing.title, "r.example.com/alpine");
    assert_eq!(report.listing.rows().len(), 4);
    assert!(report.parent_marked);
}

#[tokio::test]
async fn missing_listing_files_report_the_path() {
    let runner = Runner::new(Options {
        source: ListingSource::FilePath("/nonexistent/regtable-fixtures/tags.json".to_string()),
        kind: ListingKind::Tags,
        ..Options::default()
    })
    .unwrap();

    let err = runner.run().await.unwrap_err();
    assert!(matches!(err, RunnerError::FileRead { .. }));
    assert!(err.to_string().contains("/nonexistent/regtable-fixtures/tags.json"));
}

#[tokio::test]
async fn count_fetching_skips_repository_listings() {
    let runner = Runner::new(Options {
        source: ListingSource::Inline(alpine_listing()),
        kind: ListingKind::Repositories,
        vulns_url: Some("http://127.0.0.1:9/reg".to_string()),
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();

    let report = runner.run().await.unwrap();
    assert_eq!(report.counts_applied, 0);
    assert!(report.count_misses.is_empty());
    assert!(report.count_failures.is_empty());
}

#[tokio::test]
async fn count_fetching_skips_empty_listings() {
    let runner = Runner::new(Options {
        source: ListingSource::Inline(RegistryListing {
            registry_domain: "r.example.com".to_string(),
            name: "empty".to_string(),
            ..RegistryListing::default()
        }),
        kind: ListingKind::Tags,
        vulns_url: Some("http://127.0.0.1:9/reg".to_string()),
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();

    let report = runner.run().await.unwrap();
    assert_eq!(report.counts_applied, 0);
    assert_eq!(report.listing.rows().len(), 2);
}

#[tokio::test]
async fn reports_flow_into_every_renderer() {
    let runner = Runner::new(Options {
        source: ListingSource::Inline(alpine_listing()),
        kind: ListingKind::Tags,
        query: "edge".to_string(),
        reference_time: Some(reference()),
        ..Options::default()
    })
    .unwrap();
    let report = runner.run().await.unwrap();

    let document = output::build_document(&report.listing, &report.visibility, &report.ages);

    let text = String::from_utf8(output::render_text(&document)).unwrap();
    assert!(text.starts_with("r.example.com/alpine\n"));
    assert!(text.contains("edge"));
    assert!(text.contains("Yesterday"));
    assert!(!text.contains("3.18"));

    let value: serde_json::Value = serde_json::from_slice(&output::render_json(&document)).unwrap();
    assert_eq!(value["title"], "r.example.com/alpine");
    assert_eq!(value["rows"].as_array().unwrap().len(), 3);
    assert_eq!(value["rows"][0]["class"], "parent");
    assert_eq!(value["rows"][0]["visible"], false);
    assert_eq!(value["rows"][2]["id"], "alpine:edge");

    let html = String::from_utf8(output::render_html(&document)).unwrap();
    assert!(html.contains(r#"<table id="directory">"#));
    assert!(html.contains(r#"<tr id="alpine:edge">"#));
    assert!(html.contains(r#"style="display:none""#));
}
