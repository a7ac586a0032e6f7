//! Command-line interface definitions for secview.
//!
//! Global options (verbosity, color, config file, error format) apply to
//! every subcommand. Each subcommand maps onto one controller flow.
//!
//! # Example
//!
//! ```bash
//! # Show reports for several binaries as tabs
//! secview view ls.json sshd.json
//!
//! # Same, as JSON for scripting
//! secview view ls.json --output json
//!
//! # Build a share link for one report
//! secview share ls.json --base-url https://checksec.example/
//!
//! # Open a share link
//! secview load 'https://checksec.example/#data=eJy...'
//!
//! # One SARIF log for everything that analyzed cleanly
//! secview export *.json --combined --out findings.sarif
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::classify::SymbolCountPolicy;

/// Binary hardening report viewer.
///
/// secview turns analysis reports into judged, tabbed views, builds
/// shareable links that carry a whole report, and exports findings.
#[derive(Debug, Parser)]
#[command(name = "secview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How `symbol_count` is judged
    #[arg(long, global = true, value_enum, value_name = "POLICY")]
    pub symbol_policy: Option<SymbolCountPolicy>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze files and show one tab per file
    View(ViewArgs),
    /// Print a share link for one file's report
    Share(ShareArgs),
    /// Open a report from a share link or bare token
    Load(LoadArgs),
    /// Write SARIF 2.1.0 findings documents
    Export(ExportArgs),
}

/// Arguments for the view subcommand.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Files to analyze, in tab order
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the share subcommand.
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// File whose report is shared
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Page URL the link points at (overrides `base_url` from config)
    #[arg(long, value_name = "URL", value_parser = parse_base_url)]
    pub base_url: Option<String>,
}

/// Arguments for the load subcommand.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Share URL containing `#data=`, or the bare token
    #[arg(value_name = "URL_OR_TOKEN")]
    pub link: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the export subcommand.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Files to analyze
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Write one document covering every successful report
    #[arg(long)]
    pub combined: bool,

    /// Write to this file instead of stdout
    ///
    /// Without `--combined` and with several files, one document per file
    /// is written as `<stem>-<n>.json` next to PATH.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

/// Output format for viewed sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Validate a share base URL.
///
/// Only `http` and `https` URLs are accepted. A fragment is allowed; it is
/// replaced when the link is built.
///
/// # Examples
///
/// ```
/// use secview::cli::parse_base_url;
///
/// assert!(parse_base_url("https://checksec.example/").is_ok());
/// assert!(parse_base_url("ftp://host/").is_err());
/// ```
pub fn parse_base_url(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| format!("'{}' is not an http(s) URL", s))?;
    if rest.is_empty() || rest.starts_with('/') || rest.starts_with('#') {
        return Err(format!("'{}' has no host", s));
    }
    Ok(trimmed.to_string())
}
