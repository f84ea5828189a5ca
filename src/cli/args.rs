use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "regtable",
    version,
    about = "registry listing viewer",
    long_about = "Regtable renders the listing data behind a registry's static browse pages: relative timestamps, case-insensitive name filtering and per-tag vulnerability counts.\n\nExamples:\n  regtable -i repositories.json\n  regtable -i tags.json --kind tags -f alpine\n  regtable -i tags.json --kind tags --vulns https://r.example.com -o tags.html\n\nTip: Use --config to persist settings and keep invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        help_heading = "Input",
        help = "Listing JSON file to render; use '-' for stdin."
    )]
    pub input: Option<String>,

    #[arg(
        short = 'k',
        long = "kind",
        value_name = "KIND",
        help_heading = "Input",
        help = "Listing flavor: repositories or tags."
    )]
    pub kind: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.regtable/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'f',
        long = "filter",
        visible_alias = "query",
        value_name = "QUERY",
        help_heading = "Filtering",
        help = "Case-insensitive name filter, matched against rendered cell text."
    )]
    pub filter: Option<String>,

    #[arg(
        long = "vulns",
        value_name = "URL",
        help_heading = "Vulnerabilities",
        help = "Base URL of the vulnerability count endpoints; enables per-tag lookups."
    )]
    pub vulns: Option<String>,

    #[arg(
        short = 'r',
        long = "rate",
        value_name = "RPS",
        help_heading = "Performance",
        help = "Count request rate limit in requests per second."
    )]
    pub rate: Option<u32>,

    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance",
        help = "Maximum in-flight count requests."
    )]
    pub concurrency: Option<u32>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "insecure",
        help_heading = "HTTP",
        help = "Accept invalid TLS certificates and hostnames."
    )]
    pub insecure: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered listing to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json or html); inferred from the file extension when omitted."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
