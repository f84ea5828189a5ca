use crate::listing::{count_class, DATE_CELL};
use crate::utils::html_escape;

use super::{ListingDocument, RowRecord};

fn row_markup(document: &ListingDocument, record: &RowRecord) -> String {
    let mut attrs = String::new();
    if let Some(id) = record.id.as_deref() {
        attrs.push_str(&format!(r#" id="{}""#, html_escape(id)));
    }
    if let Some(class) = record.class.as_deref() {
        attrs.push_str(&format!(r#" class="{}""#, html_escape(class)));
    }
    if !record.visible {
        attrs.push_str(r#" style="display:none""#);
    }

    let mut cells = String::new();
    for (column, cell) in record.cells.iter().enumerate() {
        let mut text = cell.clone();
        if column == DATE_CELL {
            if let Some(age) = record.age.as_deref() {
                text = age.to_string();
            }
        }
        let class = if document.vuln_column == Some(column) {
            text.parse::<i64>().ok().map(count_class)
        } else {
            None
        };
        match class {
            Some(class) => {
                cells.push_str(&format!(r#"      <td class="{class}">{text}</td>"#));
                cells.push('\n');
            }
            None => cells.push_str(&format!("      <td>{text}</td>\n")),
        }
    }

    format!("    <tr{attrs}>\n{cells}    </tr>\n")
}

/// Standalone page carrying the enhanced table. Cells are emitted as-is
/// since they already hold the listing markup; only the title and header
/// labels are escaped.
pub fn render_html(document: &ListingDocument) -> Vec<u8> {
    let title = html_escape(&document.title);

    let mut header_cells = String::new();
    for label in document.header.iter() {
        header_cells.push_str(&format!("      <th>{}</th>\n", html_escape(label)));
    }

    let mut rows = String::new();
    for record in document.rows.iter() {
        rows.push_str(&row_markup(document, record));
    }

    let html = format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em; color: #222; }}
    h1 {{ font-size: 1.4em; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ text-align: left; padding: 0.35em 0.8em; border-bottom: 1px solid #ddd; }}
    tr.parent td {{ font-style: italic; }}
    td.danger {{ color: #b30000; font-weight: bold; }}
    td.warning {{ color: #b36b00; }}
    td.info {{ color: #31708f; }}
    a {{ color: #135bec; text-decoration: none; }}
    a:hover {{ text-decoration: underline; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <table id="directory">
    <tr>
{header_cells}    </tr>
{rows}  </table>
</body>
</html>
"##
    );

    html.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::super::{build_document, render_html};
    use crate::listing::{Listing, RegistryListing, RepositoryEntry};

    fn page() -> String {
        let data = RegistryListing {
            registry_domain: "r.example.com".to_string(),
            name: "alpine <latest>".to_string(),
            last_updated: String::new(),
            has_vulns: true,
            repositories: vec![
                RepositoryEntry {
                    name: "alpine".to_string(),
                    tag: "3.18".to_string(),
                    created: "2023-06-05T12:00:00Z".to_string(),
                    uri: String::new(),
                },
                RepositoryEntry {
                    name: "alpine".to_string(),
                    tag: "edge".to_string(),
                    created: "2023-06-14T09:30:00Z".to_string(),
                    uri: String::new(),
                },
            ],
        };
        let mut listing = Listing::tags(&data);
        listing.mark_parent_row();
        listing.set_count("alpine:3.18", 0);
        listing.set_count("alpine:edge", 5);
        let visibility = vec![true, true, true, false];
        let ages = vec![None, None, Some("2 weeks ago".to_string()), None];
        let document = build_document(&listing, &visibility, &ages);
        String::from_utf8(render_html(&document)).unwrap()
    }

    #[test]
    fn page_carries_the_table_and_row_ids() {
        let html = page();
        assert!(html.contains(r#"<table id="directory">"#));
        assert!(html.contains(r#"<tr id="alpine:3.18">"#));
        assert!(html.contains(r#"class="parent""#));
    }

    #[test]
    fn hidden_rows_keep_their_markup_but_lose_display() {
        let html = page();
        assert!(html.contains(r#"<tr id="alpine:edge" style="display:none">"#));
    }

    #[test]
    fn counts_pick_up_severity_classes() {
        let html = page();
        assert!(html.contains(r#"<td class="info">0</td>"#));
        assert!(html.contains(r#"<td class="danger">5</td>"#));
    }

    #[test]
    fn ages_replace_raw_dates() {
        let html = page();
        assert!(html.contains("<td>2 weeks ago</td>"));
        assert!(!html.contains("<td>2023-06-05T12:00:00Z</td>"));
    }

    #[test]
    fn title_is_escaped() {
        let html = page();
        assert!(html.contains("r.example.com/alpine &lt;latest&gt;"));
    }
}
