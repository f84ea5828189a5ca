use crate::cli::args::CliArgs;
use crate::output::OutputFormat;
use crate::runner::ListingKind;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.kind.as_deref() {
        if ListingKind::parse(raw).is_none() {
            return Err(format!("invalid --kind '{raw}', expected repositories or tags"));
        }
    }

    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --of '{raw}', expected text, json or html"));
        }
    }

    if let Some(raw) = args.vulns.as_deref() {
        if reqwest::Url::parse(raw).is_err() {
            return Err(format!("invalid --vulns URL '{raw}'"));
        }
    }

    if let Some(rate) = args.rate {
        if rate == 0 {
            return Err("invalid --rate, expected a positive integer".to_string());
        }
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err("invalid --concurrency, expected a positive integer".to_string());
        }
    }

    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid --timeout, expected a positive integer".to_string());
        }
    }

    Ok(())
}
