use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::enhance::{enhance, EnhanceOptions};
use crate::filter::strip_tags;
use crate::listing::{Listing, RegistryListing, DATE_CELL, NAME_CELL};
use crate::output;
use crate::runner::ListingKind;
use crate::utils::truncate_display;
use crate::vulns::{self, CountOutcome, FetchOptions};

fn print_banner() {
    const BANNER: &str = concat!(
        "regtable v",
        env!("CARGO_PKG_VERSION"),
        " - registry listing viewer"
    );
    println!("{}", BANNER.bold());
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn kind_label(kind: ListingKind) -> &'static str {
    match kind {
        ListingKind::Repositories => "repositories",
        ListingKind::Tags => "tags",
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    input: Option<String>,
    kind: ListingKind,
    query: String,
    vulns_url: Option<String>,
    rate: u32,
    concurrency: u32,
    timeout: u64,
    insecure: bool,
    output: Option<String>,
    output_format: Option<String>,
    no_color: bool,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);

    let kind_raw = args
        .kind
        .or(cfg.kind)
        .unwrap_or_else(|| "repositories".to_string());
    let kind = ListingKind::parse(&kind_raw)
        .ok_or_else(|| format!("invalid kind '{kind_raw}', expected repositories or tags"))?;

    let query = args.filter.or(cfg.filter).unwrap_or_default();

    let vulns_url = args.vulns.or(cfg.vulns);
    if let Some(url) = vulns_url.as_deref() {
        if reqwest::Url::parse(url).is_err() {
            return Err(format!("invalid vulns URL '{url}'"));
        }
    }

    let rate = args.rate.or(cfg.rate).unwrap_or(10);
    if rate == 0 {
        return Err("invalid rate, expected a positive integer".to_string());
    }
    let concurrency = args.concurrency.or(cfg.concurrency).unwrap_or(10);
    if concurrency == 0 {
        return Err("invalid concurrency, expected a positive integer".to_string());
    }
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected a positive integer".to_string());
    }
    let insecure = args.insecure || cfg.insecure.unwrap_or(false);

    let input = args.input.or(cfg.input);
    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = args.output_format.or(cfg.output_format);

    Ok(RunConfig {
        input,
        kind,
        query,
        vulns_url,
        rate,
        concurrency,
        timeout,
        insecure,
        output,
        output_format,
        no_color,
    })
}

async fn load_input(input: Option<&str>) -> Result<RegistryListing, String> {
    let raw = match input {
        None | Some("-") => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .map_err(|e| format!("failed to read listing from stdin: {e}"))?;
            raw
        }
        Some(path) => {
            let path = config::expand_tilde_string(path);
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| format!("failed to read listing file '{path}': {e}"))?
        }
    };
    serde_json::from_str::<RegistryListing>(&raw).map_err(|e| format!("invalid listing JSON: {e}"))
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

fn print_table(listing: &Listing, visibility: &[bool], ages: &[Option<String>]) {
    const MAX_NAME_WIDTH: usize = 48;

    let rows = listing.rows();
    let Some(header) = rows.first() else {
        return;
    };

    // icon column is dropped, everything else is stripped to display text
    let mut lines: Vec<(Vec<String>, bool)> = Vec::new();
    for (index, row) in rows.iter().enumerate().skip(1) {
        if !visibility.get(index).copied().unwrap_or(true) {
            continue;
        }
        let mut cells: Vec<String> = Vec::new();
        for column in 1..header.cells.len() {
            let raw = row.cells.get(column).map(String::as_str).unwrap_or("");
            let text = if column == DATE_CELL {
                match ages.get(index).and_then(|age| age.clone()) {
                    Some(age) => age,
                    None => strip_tags(raw),
                }
            } else if column == NAME_CELL {
                truncate_display(&strip_tags(raw), MAX_NAME_WIDTH)
            } else {
                strip_tags(raw)
            };
            cells.push(text);
        }
        let is_parent = row.class.as_deref() == Some("parent");
        lines.push((cells, is_parent));
    }

    let column_count = header.cells.len().saturating_sub(1);
    let mut widths: Vec<usize> = vec![0; column_count];
    for (offset, label) in header.cells.iter().skip(1).enumerate() {
        widths[offset] = display_width(label);
    }
    for (cells, _) in lines.iter() {
        for (offset, text) in cells.iter().enumerate() {
            widths[offset] = widths[offset].max(display_width(text));
        }
    }

    let mut header_line = String::new();
    for (offset, label) in header.cells.iter().skip(1).enumerate() {
        header_line.push_str(&format!("{:<width$}  ", label, width = widths[offset]));
    }
    println!("{}", header_line.trim_end().bold());

    let vuln_offset = listing.vuln_column().map(|column| column - 1);
    for (cells, is_parent) in lines.iter() {
        let mut parts: Vec<String> = Vec::new();
        for (offset, text) in cells.iter().enumerate() {
            let padded = format!("{:<width$}", text, width = widths[offset]);
            let part = if offset == 0 {
                if *is_parent {
                    padded.bold().blue().to_string()
                } else {
                    padded.cyan().to_string()
                }
            } else if Some(offset) == vuln_offset {
                match text.trim().parse::<i64>() {
                    Ok(count) if count > 0 => padded.bold().red().to_string(),
                    Ok(_) => padded.green().to_string(),
                    Err(_) => padded.normal().to_string(),
                }
            } else {
                padded.normal().to_string()
            };
            parts.push(part);
        }
        println!("{}", parts.join("  "));
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let started = Instant::now();

    let data = load_input(run.input.as_deref()).await?;
    let mut listing = match run.kind {
        ListingKind::Repositories => Listing::repositories(&data),
        ListingKind::Tags => Listing::tags(&data),
    };

    let enhanced = enhance(
        &mut listing,
        &EnhanceOptions {
            query: run.query.clone(),
            ..EnhanceOptions::default()
        },
    )
    .map_err(|e| format!("malformed listing: {e}"))?;

    format_kv_line(
        "Listing",
        &format!(
            "{} kind={} rows={} updated={}",
            listing.title,
            kind_label(run.kind),
            listing.rows().len().saturating_sub(1),
            if data.last_updated.is_empty() {
                "unknown"
            } else {
                data.last_updated.as_str()
            },
        ),
    );
    format_kv_line(
        "Filter",
        &format!(
            "query={} links_rewritten={} parent={}",
            if run.query.is_empty() {
                "none"
            } else {
                run.query.as_str()
            },
            enhanced.links_rewritten,
            format_bool(enhanced.parent_marked),
        ),
    );

    if let Some(base) = run.vulns_url.as_deref() {
        if run.kind != ListingKind::Tags {
            println!(
                "{}",
                "vulnerability counts only apply to tag listings, skipping".yellow()
            );
        } else if listing.vuln_column().is_none() {
            println!(
                "{}",
                "listing carries no vulnerability data, skipping counts".yellow()
            );
        } else {
            format_kv_line(
                "Vulns",
                &format!(
                    "endpoint={} rate={} conc={} timeout={}s insecure={}",
                    base,
                    run.rate,
                    run.concurrency,
                    run.timeout,
                    format_bool(run.insecure),
                ),
            );

            let client =
                vulns::build_client(run.timeout, run.insecure).map_err(|e| e.to_string())?;

            let pb = ProgressBar::new(data.repositories.len() as u64);
            pb.set_draw_target(ProgressDrawTarget::stderr());
            pb.enable_steady_tick(Duration::from_millis(200));
            pb.set_style(
                ProgressStyle::with_template(
                    ":: Counts: [{pos}/{len}] :: Duration: [{elapsed_precise}] :: {msg}",
                )
                .map_err(|e| format!("failed to build progress bar style: {e}"))?
                .progress_chars(r#"#>-"#),
            );

            let fetches = vulns::spawn_count_fetches(
                &client,
                base,
                &data.repositories,
                FetchOptions {
                    rate: run.rate,
                    concurrency: run.concurrency,
                },
            )
            .await;

            let applied = vulns::apply_reports(&mut listing, fetches, |outcome| {
                pb.inc(1);
                match outcome {
                    CountOutcome::Applied { key, bad_vulns } => {
                        pb.set_message(format!("{key} -> {bad_vulns}"));
                    }
                    CountOutcome::MissingRow { key } => {
                        pb.println(format!("no listing row for report '{key}'"));
                    }
                    CountOutcome::Failed { key, error } => {
                        pb.println(format!("count lookup failed for '{key}': {error}"));
                    }
                }
            })
            .await;
            pb.finish_and_clear();

            format_kv_line(
                "Counts",
                &format!("applied={}/{}", applied, data.repositories.len()),
            );
        }
    }
    println!();

    let now = chrono::Utc::now();
    let ages = listing.ages(now);
    print_table(&listing, &enhanced.visibility, &ages);

    if let Some(outfile_path) = run.output.as_ref() {
        let output_format = run
            .output_format
            .as_deref()
            .and_then(output::OutputFormat::parse)
            .or_else(|| output::infer_format_from_path(outfile_path))
            .unwrap_or(output::OutputFormat::Text);

        let document = output::build_document(&listing, &enhanced.visibility, &ages);
        let rendered = match output_format {
            output::OutputFormat::Text => output::render_text(&document),
            output::OutputFormat::Json => output::render_json(&document),
            output::OutputFormat::Html => output::render_html(&document),
        };

        let mut outfile = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(outfile_path)
            .await
            .map_err(|e| format!("failed to open output file: {e}"))?;
        outfile
            .write_all(&rendered)
            .await
            .map_err(|_| "failed to write output file".to_string())?;
    }

    let shown = enhanced.visibility.iter().skip(1).filter(|v| **v).count();
    let total = listing.rows().len().saturating_sub(1);
    let elapsed_time = started.elapsed();

    println!();
    println!(
        ":: Completed :: {} of {} rows shown :: took {}ms ::",
        shown,
        total,
        elapsed_time.as_millis()
    );

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", e.render());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
