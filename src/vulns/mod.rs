use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures_util::StreamExt;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::listing::{Listing, RepositoryEntry};

/// Slice of the scan report the count endpoint returns. Field names match
/// the server's JSON casing.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct VulnerabilityReport {
    #[serde(rename = "Repo")]
    pub repo: String,
    #[serde(rename = "Tag")]
    pub tag: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "BadVulns")]
    pub bad_vulns: i64,
}

impl VulnerabilityReport {
    pub fn key(&self) -> String {
        format!("{}:{}", self.repo, self.tag)
    }
}

#[derive(Debug, Error)]
pub enum VulnsError {
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid report from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Count endpoint for one repo-tag pair, as the server routes it.
pub fn count_url(base: &str, repo: &str, tag: &str) -> String {
    format!("{}/repo/{}/tag/{}/vulns.json", base.trim_end_matches('/'), repo, tag)
}

pub fn build_client(timeout_seconds: u64, insecure: bool) -> Result<reqwest::Client, VulnsError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("regtable/", env!("CARGO_PKG_VERSION"))),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(timeout_seconds));
    if insecure {
        builder = builder
            .danger_accept_invalid_hostnames(true)
            .danger_accept_invalid_certs(true);
    }
    builder.build().map_err(|e| VulnsError::ClientBuild { source: e })
}

pub async fn fetch_report(
    client: &reqwest::Client,
    url: &str,
) -> Result<VulnerabilityReport, VulnsError> {
    let response = client.get(url).send().await.map_err(|e| VulnsError::Request {
        url: url.to_string(),
        source: e,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(VulnsError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    response
        .json::<VulnerabilityReport>()
        .await
        .map_err(|e| VulnsError::Decode {
            url: url.to_string(),
            source: e,
        })
}

#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    pub rate: u32,
    pub concurrency: u32,
}

/// One in-flight count lookup. Abort it when its row is discarded before
/// the response lands.
#[derive(Debug)]
pub struct CountFetch {
    pub key: String,
    handle: JoinHandle<Result<VulnerabilityReport, VulnsError>>,
}

impl CountFetch {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Spawns one lookup task per listing entry against the count endpoint.
/// Dispatch is paced at `rate` per second and capped at `concurrency`
/// requests in flight.
pub async fn spawn_count_fetches(
    client: &reqwest::Client,
    base: &str,
    entries: &[RepositoryEntry],
    options: FetchOptions,
) -> Vec<CountFetch> {
    let limit = NonZeroU32::new(options.rate).unwrap_or(NonZeroU32::MIN);
    let lim = RateLimiter::direct(Quota::per_second(limit));
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1) as usize));

    let mut fetches = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        lim.until_ready().await;
        let url = count_url(base, &entry.name, &entry.tag);
        let key = format!("{}:{}", entry.name, entry.tag);
        let client = client.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            fetch_report(&client, &url).await
        });
        fetches.push(CountFetch { key, handle });
    }
    fetches
}

/// What became of one fetch when its report was applied back to a listing.
#[derive(Debug)]
pub enum CountOutcome {
    Applied { key: String, bad_vulns: i64 },
    MissingRow { key: String },
    Failed { key: String, error: VulnsError },
}

/// Joins the fetches in completion order and writes each count into its
/// row. Reports whose row no longer exists are surfaced through `on_event`
/// and otherwise dropped, as are fetches that were aborted mid-flight.
/// Returns how many counts landed in the listing.
pub async fn apply_reports(
    listing: &mut Listing,
    fetches: Vec<CountFetch>,
    mut on_event: impl FnMut(CountOutcome),
) -> usize {
    let mut pending = FuturesUnordered::new();
    for fetch in fetches {
        let CountFetch { key, handle } = fetch;
        pending.push(async move { (key, handle.await) });
    }

    let mut applied = 0usize;
    while let Some((key, joined)) = pending.next().await {
        match joined {
            Ok(Ok(report)) => {
                let id = report.key();
                if listing.set_count(&id, report.bad_vulns) {
                    applied += 1;
                    on_event(CountOutcome::Applied {
                        key: id,
                        bad_vulns: report.bad_vulns,
                    });
                } else {
                    on_event(CountOutcome::MissingRow { key: id });
                }
            }
            Ok(Err(error)) => on_event(CountOutcome::Failed { key, error }),
            Err(_) => {}
        }
    }
    applied
}
