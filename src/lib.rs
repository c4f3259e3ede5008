//! hashdupe - streaming duplicate file finder
//!
//! Walks a directory tree once in a fixed depth-first order, fingerprints
//! every non-empty regular file with a 128-bit BLAKE3 digest and labels each
//! file either the original for its content (first seen) or a duplicate of
//! that original. Results stream out while the walk is still running.
//!
//! ```no_run
//! use hashdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (groups, summary) = finder.find_duplicates(Path::new("/data")).unwrap();
//! for group in &groups {
//!     println!("{} has {} copies", group.original.display(), group.duplicates.len());
//! }
//! println!("{} reclaimable", summary.reclaimable_display());
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::WalkerConfig;

/// Run the CLI, writing the report to stdout.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the root cannot be
/// scanned, the scan is interrupted, or the report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let interactive = stdout.is_terminal();
    run_app_with_output(cli, stdout.lock(), interactive)
}

/// Run the CLI, writing the report to `out`.
///
/// Colors and progress bars are only used when `interactive` is set.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_app_with_output<W: Write>(cli: Cli, out: W, interactive: bool) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !interactive {
        yansi::disable();
    }

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet, out, interactive),
    }
}

fn run_scan<W: Write>(args: &ScanArgs, quiet: bool, out: W, interactive: bool) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => Config::try_load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    log::debug!("Effective configuration: {:?}", config);

    let handler = signal::install_handler()?;
    let mut finder_config = finder_config(args, &config)?.with_shutdown_flag(handler.get_flag());

    let show_progress = config.progress
        && !args.no_progress
        && !quiet
        && interactive
        && io::stderr().is_terminal();
    if show_progress {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new()));
    }

    let finder = DuplicateFinder::new(finder_config);
    let mut reporter = output::reporter_for(args.output, Box::new(out));
    let report = finder.scan(&args.path, reporter.as_mut())?;

    let exit_code = ExitCode::for_scan(
        report.summary.duplicate_files,
        report.summary.has_errors(),
    );
    reporter
        .finish(&report, exit_code)
        .context("Failed to write report")?;
    Ok(exit_code)
}

/// Merge CLI flags over the loaded configuration.
fn finder_config(args: &ScanArgs, config: &Config) -> Result<FinderConfig> {
    let chunk_size = match args.chunk_size {
        Some(bytes) => usize::try_from(bytes).context("Chunk size does not fit in memory")?,
        None => config.chunk_size,
    };

    let mut patterns = config.ignore_patterns.clone();
    patterns.extend(args.ignore_patterns.iter().cloned());

    let walker_config = WalkerConfig::default()
        .with_skip_hidden(args.skip_hidden || config.skip_hidden)
        .with_patterns(patterns)
        .with_respect_gitignore(args.gitignore || config.respect_gitignore)
        .with_max_depth(args.max_depth.or(config.max_depth));

    Ok(FinderConfig::default()
        .with_io_threads(args.io_threads.unwrap_or(config.io_threads))
        .with_chunk_size(chunk_size)
        .with_batch_size(args.batch_size.unwrap_or(config.batch_size))
        .with_strict(args.strict || config.strict)
        .with_walker_config(walker_config))
}
