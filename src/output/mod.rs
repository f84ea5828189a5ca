pub mod report;

use serde::Serialize;

use crate::filter::strip_tags;
use crate::listing::{Listing, DATE_CELL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct RowRecord {
    pub id: Option<String>,
    pub class: Option<String>,
    pub visible: bool,
    pub age: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListingDocument {
    pub title: String,
    pub header: Vec<String>,
    pub vuln_column: Option<usize>,
    pub rows: Vec<RowRecord>,
}

/// Flattens a listing and its per-row annotations into one serializable
/// document. Row 0 becomes the header; `visibility` and `ages` are indexed
/// by listing row, rows missing an entry default to visible and ageless.
pub fn build_document(listing: &Listing, visibility: &[bool], ages: &[Option<String>]) -> ListingDocument {
    let header = listing
        .rows()
        .first()
        .map(|row| row.cells.clone())
        .unwrap_or_default();

    let rows = listing
        .rows()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, row)| RowRecord {
            id: row.id.clone(),
            class: row.class.clone(),
            visible: visibility.get(index).copied().unwrap_or(true),
            age: ages.get(index).cloned().flatten(),
            cells: row.cells.clone(),
        })
        .collect();

    ListingDocument {
        title: listing.title.clone(),
        header,
        vuln_column: listing.vuln_column(),
        rows,
    }
}

fn display_cells(document: &ListingDocument, record: &RowRecord) -> Vec<String> {
    (0..document.header.len())
        .map(|column| {
            if column == DATE_CELL {
                if let Some(age) = record.age.as_deref() {
                    return age.to_string();
                }
            }
            record
                .cells
                .get(column)
                .map(|cell| strip_tags(cell))
                .unwrap_or_default()
        })
        .collect()
}

/// Plain rendering of the visible rows with aligned columns. Columns that
/// are empty everywhere (the icon column) are dropped.
pub fn render_text(document: &ListingDocument) -> Vec<u8> {
    let rendered: Vec<Vec<String>> = document
        .rows
        .iter()
        .filter(|record| record.visible)
        .map(|record| display_cells(document, record))
        .collect();

    let column_count = document.header.len();
    let mut widths = vec![0usize; column_count];
    for (column, label) in document.header.iter().enumerate() {
        widths[column] = label.chars().count();
    }
    for cells in rendered.iter() {
        for (column, text) in cells.iter().enumerate() {
            if column < column_count {
                widths[column] = widths[column].max(text.chars().count());
            }
        }
    }

    let keep: Vec<usize> = (0..column_count).filter(|&column| widths[column] > 0).collect();

    let mut out = String::new();
    out.push_str(&document.title);
    out.push('\n');
    out.push_str(&format_row(&document.header, &keep, &widths));
    for cells in rendered.iter() {
        out.push_str(&format_row(cells, &keep, &widths));
    }
    out.into_bytes()
}

fn format_row(cells: &[String], keep: &[usize], widths: &[usize]) -> String {
    let mut line = String::new();
    for (position, &column) in keep.iter().enumerate() {
        let text = cells.get(column).map(String::as_str).unwrap_or("");
        if position + 1 == keep.len() {
            line.push_str(text);
        } else {
            line.push_str(&format!("{:<width$}  ", text, width = widths[column]));
        }
    }
    while line.ends_with(' ') {
        line.pop();
    }
    line.push('\n');
    line
}

pub fn render_json(document: &ListingDocument) -> Vec<u8> {
    serde_json::to_vec_pretty(document).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(document: &ListingDocument) -> Vec<u8> {
    report::render_html(document)
}
