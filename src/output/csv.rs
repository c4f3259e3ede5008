//! CSV report, one row per duplicate file.
//!
//! # Columns
//!
//! - `group_id`: 1-based group number, in the order groups were discovered
//! - `fingerprint`: content fingerprint (32 hex digits)
//! - `original`: path of the first file seen with this content
//! - `duplicate`: path of the duplicate
//! - `size`: file size in bytes
//!
//! Rows are written as duplicates are classified, so the file grows while
//! the scan runs.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use super::{display_path, OutputError, Reporter};
use crate::duplicates::{ClassificationEvent, EventSink, ScanReport};
use crate::error::ExitCode;
use crate::scanner::Fingerprint;

#[derive(Debug, Serialize)]
struct CsvRow {
    group_id: usize,
    fingerprint: String,
    original: String,
    duplicate: String,
    size: u64,
}

/// Streaming CSV reporter.
pub struct CsvReporter<W: Write> {
    writer: csv::Writer<W>,
    group_ids: HashMap<Fingerprint, usize>,
    error: Option<csv::Error>,
}

impl<W: Write> CsvReporter<W> {
    /// Create a reporter writing to `writer`. The header row is written
    /// with the first duplicate.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            group_ids: HashMap::new(),
            error: None,
        }
    }

    /// Flush and give back the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }

    fn group_id(&mut self, fingerprint: Fingerprint) -> usize {
        let next = self.group_ids.len() + 1;
        *self.group_ids.entry(fingerprint).or_insert(next)
    }
}

impl<W: Write> EventSink for CsvReporter<W> {
    fn on_event(&mut self, event: &ClassificationEvent) {
        let ClassificationEvent::DuplicateOf {
            original_path,
            duplicate_path,
            fingerprint,
            size,
        } = event
        else {
            return;
        };
        if self.error.is_some() {
            return;
        }

        let row = CsvRow {
            group_id: self.group_id(*fingerprint),
            fingerprint: fingerprint.to_hex(),
            original: display_path(original_path),
            duplicate: display_path(duplicate_path),
            size: *size,
        };
        if let Err(e) = self.writer.serialize(row) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn finish(&mut self, _report: &ScanReport, _exit_code: ExitCode) -> Result<(), OutputError> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.writer.flush()?;
        Ok(())
    }
}
