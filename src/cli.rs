//! Command-line interface definitions for hashdupe.
//!
//! Global options (verbosity, color, error format) come before the
//! subcommand; scan options after it.
//!
//! # Example
//!
//! ```bash
//! # Stream duplicates as they are found
//! hashdupe scan ~/Downloads
//!
//! # Machine-readable report
//! hashdupe scan ~/Downloads --output json
//!
//! # Sequential hashing with a bigger read buffer
//! hashdupe scan ~/Downloads --io-threads 1 --chunk-size 1MiB
//! ```

use std::path::PathBuf;

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Streaming duplicate file finder.
///
/// Walks a directory tree once, fingerprints every file with BLAKE3 and
/// reports each file whose content was already seen earlier in the walk.
#[derive(Debug, Parser)]
#[command(name = "hashdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
}

/// Arguments for the scan subcommand.
///
/// Options left unset fall back to the config file and `HASHDUPE_*`
/// environment variables.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Number of hashing threads (1 hashes sequentially)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Read buffer size per hashing thread (e.g. 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Files hashed per parallel batch
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Also skip files matched by the .gitignore at the scan root
    #[arg(long)]
    pub gitignore: bool,

    /// Maximum directory depth (1 = only the root's own files)
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Abort on the first unreadable file or directory
    #[arg(long)]
    pub strict: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines, streamed as duplicates are found
    Text,
    /// JSON document written when the scan completes
    Json,
    /// One CSV row per duplicate
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Case-insensitive; numbers without a suffix are bytes.
///
/// # Examples
///
/// ```
/// use hashdupe::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// ```
///
/// # Errors
///
/// Returns an error for empty input, a malformed number or an unknown suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
