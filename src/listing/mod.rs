use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::strip_tags;
use crate::timefmt;

pub const NAME_CELL: usize = 1;
pub const DATE_CELL: usize = 2;

/// Listing payload served alongside the static registry pages.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryListing {
    pub registry_domain: String,
    pub name: String,
    pub last_updated: String,
    pub has_vulns: bool,
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryEntry {
    pub name: String,
    pub tag: String,
    pub created: String,
    pub uri: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub id: Option<String>,
    pub class: Option<String>,
    pub cells: Vec<String>,
}

/// In-memory model of one rendered directory table: a header row followed
/// by data rows, all addressable by position.
#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub title: String,
    rows: Vec<Row>,
    vuln_column: Option<usize>,
}

impl Listing {
    pub fn new(title: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            title: title.into(),
            rows: vec![Row {
                id: None,
                class: None,
                cells: header,
            }],
            vuln_column: None,
        }
    }

    /// Index page: one row per repository.
    pub fn repositories(data: &RegistryListing) -> Self {
        let mut listing = Listing::new(
            data.registry_domain.clone(),
            vec!["".to_string(), "Name".to_string(), "Last Modified".to_string()],
        );
        for repo in data.repositories.iter() {
            listing.push_row(Row {
                id: None,
                class: None,
                cells: vec![
                    String::new(),
                    format!(r#"<a href="repo/{name}/tags.html">{name}</a>"#, name = repo.name),
                    repo.created.clone(),
                ],
            });
        }
        listing
    }

    /// Tag page for one repository: a parent link back to the index, then
    /// one row per tag keyed "name:tag" for count lookups. The
    /// Vulnerabilities column exists only when the payload says a scanner
    /// is attached (`hasVulns`).
    pub fn tags(data: &RegistryListing) -> Self {
        let title = if data.name.is_empty() {
            data.registry_domain.clone()
        } else {
            format!("{}/{}", data.registry_domain, data.name)
        };
        let mut header = vec![
            "".to_string(),
            "Name".to_string(),
            "Last Modified".to_string(),
        ];
        if data.has_vulns {
            header.push("Vulnerabilities".to_string());
        }
        let mut listing = Listing::new(title, header);
        listing.vuln_column = data.has_vulns.then_some(3);

        let mut parent_cells = vec![
            String::new(),
            r#"<a href="../index.html">Parent Directory</a>"#.to_string(),
            String::new(),
        ];
        if data.has_vulns {
            parent_cells.push(String::new());
        }
        listing.push_row(Row {
            id: None,
            class: None,
            cells: parent_cells,
        });

        for repo in data.repositories.iter() {
            let mut cells = vec![
                String::new(),
                format!(r#"<a href="tag/{tag}.html">{tag}</a>"#, tag = repo.tag),
                repo.created.clone(),
            ];
            if data.has_vulns {
                cells.push(String::new());
            }
            listing.push_row(Row {
                id: Some(format!("{}:{}", repo.name, repo.tag)),
                class: None,
                cells,
            });
        }
        listing
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn vuln_column(&self) -> Option<usize> {
        self.vuln_column
    }

    /// Tags the first data row as the parent link when its rendered name
    /// reads "Parent Directory". Returns whether the class was applied.
    pub fn mark_parent_row(&mut self) -> bool {
        let Some(row) = self.rows.get_mut(1) else {
            return false;
        };
        let Some(cell) = row.cells.get(NAME_CELL) else {
            return false;
        };
        if strip_tags(cell) != "Parent Directory" {
            return false;
        }
        row.class = Some("parent".to_string());
        true
    }

    /// Drops the first ".html" from every href value so links resolve
    /// against the extensionless server routes. Returns how many hrefs
    /// changed. Rendered text is left alone.
    pub fn rewrite_links(&mut self) -> usize {
        let mut rewritten = 0usize;
        for row in self.rows.iter_mut().skip(1) {
            for cell in row.cells.iter_mut() {
                let replaced = href_pattern()
                    .replace_all(cell.as_str(), |caps: &regex::Captures<'_>| {
                        let href = &caps[1];
                        if href.contains(".html") {
                            rewritten += 1;
                            format!(r#"href="{}""#, href.replacen(".html", "", 1))
                        } else {
                            caps[0].to_string()
                        }
                    })
                    .into_owned();
                *cell = replaced;
            }
        }
        rewritten
    }

    /// Writes a fetched count into the row whose id matches `key`.
    pub fn set_count(&mut self, key: &str, count: i64) -> bool {
        let Some(column) = self.vuln_column else {
            return false;
        };
        for row in self.rows.iter_mut().skip(1) {
            if row.id.as_deref() != Some(key) {
                continue;
            }
            let Some(cell) = row.cells.get_mut(column) else {
                return false;
            };
            *cell = count.to_string();
            return true;
        }
        false
    }

    /// Relative age per row, aligned with rows(). The header row and
    /// unparseable dates yield None.
    pub fn ages(&self, now: DateTime<Utc>) -> Vec<Option<String>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if index == 0 {
                    return None;
                }
                row.cells
                    .get(DATE_CELL)
                    .and_then(|cell| timefmt::pretty_date(cell, now))
            })
            .collect()
    }
}

static HREF_PATTERN: OnceLock<Regex> = OnceLock::new();

fn href_pattern() -> &'static Regex {
    HREF_PATTERN.get_or_init(|| Regex::new(r#"href="([^"]*)""#).unwrap())
}

/// CSS class the rendered pages use for a vulnerability severity label.
pub fn severity_class(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "high" | "critical" | "defcon1" => "danger",
        "medium" => "warning",
        "low" | "negligible" => "info",
        _ => "default",
    }
}

/// Counts track high severity and above, so any non-zero count renders
/// with the high-severity styling.
pub fn count_class(count: i64) -> &'static str {
    if count > 0 {
        severity_class("high")
    } else {
        severity_class("negligible")
    }
}
