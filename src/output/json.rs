//! JSON report for scripting and automation.
//!
//! Written once the scan has completed.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "fingerprint": "af1349b9f5f9a1a6a0404dea36dcc949",
//!       "size": 1024,
//!       "original": "/data/a.bin",
//!       "duplicates": ["/data/b.bin", "/data/old/a.bin"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_bytes": 1048576,
//!     "reclaimable_bytes": 2048,
//!     "group_count": 1,
//!     "duplicate_files": 2,
//!     "empty_files": 0,
//!     "skipped_files": 0,
//!     "walk_errors": 0,
//!     "errors": [],
//!     "scan_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "HD000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::{display_path, OutputError, Reporter};
use crate::duplicates::{ClassificationEvent, DuplicateGroup, EventSink, ScanReport, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::ScanError;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content fingerprint as hexadecimal string (32 characters)
    pub fingerprint: String,
    /// File size in bytes
    pub size: u64,
    /// The first file seen with this content
    pub original: String,
    /// Every later file with the same content, in traversal order
    pub duplicates: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint.to_hex(),
            size: group.size,
            original: display_path(&group.original),
            duplicates: group.duplicates.iter().map(|p| display_path(p)).collect(),
        }
    }
}

/// A non-fatal error in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Affected path, if known
    pub path: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl From<&ScanError> for JsonError {
    fn from(err: &ScanError) -> Self {
        Self {
            path: err.path().map(display_path),
            message: err.to_string(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Regular files found, including empty and skipped ones
    pub total_files: usize,
    /// Bytes hashed
    pub total_bytes: u64,
    /// Bytes occupied by duplicates
    pub reclaimable_bytes: u64,
    /// Number of duplicate groups
    pub group_count: usize,
    /// Number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Zero-length files
    pub empty_files: usize,
    /// Files that could not be read
    pub skipped_files: usize,
    /// Directory traversal errors
    pub walk_errors: usize,
    /// Details of every skipped file and traversal error
    pub errors: Vec<JsonError>,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "HD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_bytes: summary.total_bytes,
            reclaimable_bytes: summary.reclaimable_bytes,
            group_count: summary.group_count,
            duplicate_files: summary.duplicate_files,
            empty_files: summary.empty_files,
            skipped_files: summary.skipped_files,
            walk_errors: summary.walk_errors,
            errors: summary.errors.iter().map(JsonError::from).collect(),
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups in discovery order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use hashdupe::duplicates::ScanSummary;
    /// use hashdupe::error::ExitCode;
    /// use hashdupe::output::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.duplicates.is_empty());
    /// assert_eq!(output.summary.exit_code_name, "HD002");
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Reporter that writes a [`JsonOutput`] document when the scan ends.
pub struct JsonReporter<W: Write> {
    writer: W,
}

impl<W: Write> JsonReporter<W> {
    /// Create a reporter writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonReporter<W> {
    fn on_event(&mut self, _event: &ClassificationEvent) {}
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn finish(&mut self, report: &ScanReport, exit_code: ExitCode) -> Result<(), OutputError> {
        let output = JsonOutput::new(&report.groups, &report.summary, exit_code);
        serde_json::to_writer_pretty(&mut self.writer, &output)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
