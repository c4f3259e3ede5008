//! Report writers for scan results.
//!
//! Every reporter is an [`EventSink`], so it sees classification events
//! while the scan runs, and gets the final [`ScanReport`] once it ends:
//! - [`TextReporter`] streams one line per duplicate for humans
//! - [`CsvReporter`] streams one row per duplicate
//! - [`JsonReporter`] writes a single document at the end
//!
//! # Example
//!
//! ```no_run
//! use hashdupe::cli::OutputFormat;
//! use hashdupe::duplicates::DuplicateFinder;
//! use hashdupe::error::ExitCode;
//! use hashdupe::output::reporter_for;
//! use std::path::Path;
//!
//! let mut reporter = reporter_for(OutputFormat::Csv, Box::new(std::io::stdout()));
//! let report = DuplicateFinder::with_defaults()
//!     .scan(Path::new("."), reporter.as_mut())
//!     .unwrap();
//! reporter.finish(&report, ExitCode::Success).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io::{self, Write};
use std::path::Path;

use crate::cli::OutputFormat;
use crate::duplicates::{EventSink, ScanReport};
use crate::error::ExitCode;

pub use self::csv::CsvReporter;
pub use self::json::{JsonOutput, JsonReporter};
pub use self::text::TextReporter;

/// Errors that can occur while writing a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A sink that also renders the final result.
pub trait Reporter: EventSink {
    /// Write whatever remains once the scan has completed.
    ///
    /// # Errors
    ///
    /// Returns the first write error, including any raised while streaming
    /// events.
    fn finish(&mut self, report: &ScanReport, exit_code: ExitCode) -> Result<(), OutputError>;
}

/// Build the reporter for `format`, writing to `writer`.
#[must_use]
pub fn reporter_for<'w>(format: OutputFormat, writer: Box<dyn Write + 'w>) -> Box<dyn Reporter + 'w> {
    match format {
        OutputFormat::Text => Box::new(TextReporter::new(writer)),
        OutputFormat::Json => Box::new(JsonReporter::new(writer)),
        OutputFormat::Csv => Box::new(CsvReporter::new(writer)),
    }
}

/// Path as a display string; non-UTF-8 bytes are replaced.
pub(crate) fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
