//! Human-readable report.
//!
//! Each duplicate is printed as soon as it is classified. Every
//! [`PANEL_INTERVAL`] duplicates a running total of reclaimable space is
//! printed, and a summary closes the report.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::{display_path, OutputError, Reporter};
use crate::duplicates::{ClassificationEvent, EventSink, ScanReport};
use crate::error::ExitCode;

/// Duplicates between two running-total panels.
pub const PANEL_INTERVAL: usize = 100;

/// Streaming text reporter.
pub struct TextReporter<W: Write> {
    writer: W,
    duplicates: usize,
    reclaimable: u64,
    error: Option<io::Error>,
}

impl<W: Write> TextReporter<W> {
    /// Create a reporter writing to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            duplicates: 0,
            reclaimable: 0,
            error: None,
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_duplicate(&mut self, event: &ClassificationEvent) -> io::Result<()> {
        let ClassificationEvent::DuplicateOf {
            original_path,
            duplicate_path,
            fingerprint,
            size,
        } = event
        else {
            return Ok(());
        };

        self.duplicates += 1;
        self.reclaimable += size;

        writeln!(
            self.writer,
            "{}  {}  {} {}",
            fingerprint.to_string().dim(),
            format!("{:>10}", ByteSize(*size).to_string()).cyan(),
            display_path(duplicate_path).bold(),
            format!("== {}", display_path(original_path)).dim(),
        )?;

        if self.duplicates % PANEL_INTERVAL == 0 {
            writeln!(
                self.writer,
                "{}",
                format!(
                    "--- {} duplicates so far, {} reclaimable ---",
                    self.duplicates,
                    ByteSize(self.reclaimable)
                )
                .yellow()
            )?;
        }
        Ok(())
    }

    fn write_summary(&mut self, report: &ScanReport) -> io::Result<()> {
        let summary = &report.summary;

        if self.duplicates > 0 {
            writeln!(self.writer)?;
        }
        writeln!(
            self.writer,
            "Scanned {} files ({} hashed, {} empty) in {:.2?}",
            summary.total_files,
            summary.total_size_display(),
            summary.empty_files,
            summary.scan_duration
        )?;

        if summary.duplicate_files == 0 {
            writeln!(self.writer, "{}", "No duplicates found".green())?;
        } else {
            writeln!(
                self.writer,
                "Found {} duplicates in {} groups, {} reclaimable ({:.1}%)",
                summary.duplicate_files.red().bold(),
                summary.group_count,
                summary.reclaimable_display().red().bold(),
                summary.reclaimable_percentage()
            )?;
        }

        if summary.has_errors() {
            writeln!(
                self.writer,
                "{}",
                format!(
                    "Skipped {} unreadable files and {} directory errors (rerun with -v for details)",
                    summary.skipped_files, summary.walk_errors
                )
                .yellow()
            )?;
        }
        self.writer.flush()
    }
}

impl<W: Write> EventSink for TextReporter<W> {
    fn on_event(&mut self, event: &ClassificationEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_duplicate(event) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn finish(&mut self, report: &ScanReport, _exit_code: ExitCode) -> Result<(), OutputError> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.write_summary(report)?;
        Ok(())
    }
}
