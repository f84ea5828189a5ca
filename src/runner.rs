use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;

use crate::enhance::{enhance, EnhanceOptions};
use crate::filter::FilterError;
use crate::listing::{Listing, RegistryListing};
use crate::vulns::{self, CountOutcome, FetchOptions, VulnsError};

#[derive(Clone, Debug)]
pub enum ListingSource {
    FilePath(String),
    Inline(RegistryListing),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingKind {
    Repositories,
    Tags,
}

impl ListingKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "repositories" | "repos" => Some(Self::Repositories),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub source: ListingSource,
    pub kind: ListingKind,
    pub query: String,
    pub mark_parent: bool,
    pub rewrite_links: bool,
    pub vulns_url: Option<String>,
    pub rate: u32,
    pub concurrency: u32,
    pub timeout_seconds: u64,
    pub insecure: bool,
    pub reference_time: Option<DateTime<Utc>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: ListingSource::Inline(RegistryListing::default()),
            kind: ListingKind::Repositories,
            query: String::new(),
            mark_parent: true,
            rewrite_links: true,
            vulns_url: None,
            rate: 10,
            concurrency: 10,
            timeout_seconds: 10,
            insecure: false,
            reference_time: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to read listing file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listing JSON in '{path}': {source}")]
    ParseListing {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid rate {value}, expected a positive integer")]
    InvalidRate { value: u32 },

    #[error("invalid concurrency {value}, expected a positive integer")]
    InvalidConcurrency { value: u32 },

    #[error("invalid timeout {value}, expected a positive integer")]
    InvalidTimeout { value: u64 },

    #[error("invalid vulnerability endpoint URL '{url}'")]
    InvalidVulnsUrl { url: String },

    #[error("listing rows are malformed: {source}")]
    MalformedListing {
        #[source]
        source: FilterError,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClient {
        #[source]
        source: VulnsError,
    },
}

/// Everything one run produced. `visibility` and `ages` are indexed by
/// listing row, header included.
#[derive(Debug)]
pub struct RunReport {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub listing: Listing,
    pub visibility: Vec<bool>,
    pub ages: Vec<Option<String>>,
    pub parent_marked: bool,
    pub links_rewritten: usize,
    pub counts_applied: usize,
    pub count_misses: Vec<String>,
    pub count_failures: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.rate == 0 {
            return Err(RunnerError::InvalidRate { value: options.rate });
        }
        if options.concurrency == 0 {
            return Err(RunnerError::InvalidConcurrency {
                value: options.concurrency,
            });
        }
        if options.timeout_seconds == 0 {
            return Err(RunnerError::InvalidTimeout {
                value: options.timeout_seconds,
            });
        }
        if let Some(url) = options.vulns_url.as_deref() {
            if reqwest::Url::parse(url).is_err() {
                return Err(RunnerError::InvalidVulnsUrl { url: url.to_string() });
            }
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Loads the listing, applies the page behaviors and, for tag listings
    /// with an endpoint configured, fills in vulnerability counts.
    pub async fn run(&self) -> Result<RunReport, RunnerError> {
        let started_at = Instant::now();

        let data = load_listing(&self.options.source).await?;
        let mut listing = match self.options.kind {
            ListingKind::Repositories => Listing::repositories(&data),
            ListingKind::Tags => Listing::tags(&data),
        };

        let enhanced = enhance(
            &mut listing,
            &EnhanceOptions {
                query: self.options.query.clone(),
                mark_parent: self.options.mark_parent,
                rewrite_links: self.options.rewrite_links,
            },
        )
        .map_err(|e| RunnerError::MalformedListing { source: e })?;

        let mut counts_applied = 0usize;
        let mut count_misses: Vec<String> = Vec::new();
        let mut count_failures: Vec<String> = Vec::new();
        if let Some(base) = self.options.vulns_url.as_deref() {
            if self.options.kind == ListingKind::Tags
                && listing.vuln_column().is_some()
                && !data.repositories.is_empty()
            {
                let client = vulns::build_client(self.options.timeout_seconds, self.options.insecure)
                    .map_err(|e| RunnerError::HttpClient { source: e })?;
                let fetches = vulns::spawn_count_fetches(
                    &client,
                    base,
                    &data.repositories,
                    FetchOptions {
                        rate: self.options.rate,
                        concurrency: self.options.concurrency,
                    },
                )
                .await;
                counts_applied =
                    vulns::apply_reports(&mut listing, fetches, |outcome| match outcome {
                        CountOutcome::Applied { .. } => {}
                        CountOutcome::MissingRow { key } => count_misses.push(key),
                        CountOutcome::Failed { key, error } => {
                            count_failures.push(format!("{key}: {error}"))
                        }
                    })
                    .await;
            }
        }

        let now = self.options.reference_time.unwrap_or_else(Utc::now);
        let ages = listing.ages(now);

        let elapsed = started_at.elapsed();
        Ok(RunReport {
            started_at,
            elapsed,
            listing,
            visibility: enhanced.visibility,
            ages,
            parent_marked: enhanced.parent_marked,
            links_rewritten: enhanced.links_rewritten,
            counts_applied,
            count_misses,
            count_failures,
        })
    }
}

async fn load_listing(source: &ListingSource) -> Result<RegistryListing, RunnerError> {
    match source {
        ListingSource::Inline(data) => Ok(data.clone()),
        ListingSource::FilePath(path) => {
            let path = crate::config::expand_tilde_string(path.as_str());
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| RunnerError::FileRead {
                    path: path.clone(),
                    source: e,
                })?;
            serde_json::from_str::<RegistryListing>(&raw)
                .map_err(|e| RunnerError::ParseListing { path, source: e })
        }
    }
}
