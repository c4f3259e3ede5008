//! Logging setup for hashdupe.
//!
//! Diagnostics go through the `log` facade to stderr via `env_logger`, so
//! they never mix with the report written to stdout. The level comes from
//! (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors only) or `-v`/`-vv`/`-vvv`
//! 3. Default: warnings only
//!
//! # Example
//!
//! ```rust,no_run
//! use hashdupe::logging::init_logging;
//!
//! // Show per-phase info messages (-v)
//! init_logging(1, false);
//! log::info!("Scan started");
//! ```

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize the logger from CLI verbosity flags.
///
/// Safe to call more than once: later calls leave the first logger in place,
/// which keeps repeated `run_app` calls in tests from panicking.
///
/// # Arguments
///
/// * `verbose` - Verbosity count (0=warn, 1=info, 2=debug, 3+=trace)
/// * `quiet` - If true, only errors are shown (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::trace!("Logger already initialized");
        return;
    }

    if from_env {
        log::debug!(
            "Logging initialized from RUST_LOG={:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level {:?}",
            determine_level(verbose, quiet)
        );
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Debug builds and `-vv` get timestamps and module paths; otherwise the
/// format is just level and message.
fn configure_format(builder: &mut Builder, verbose: u8) {
    let detailed = cfg!(debug_assertions) || verbose >= 2;

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if detailed {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });
}
