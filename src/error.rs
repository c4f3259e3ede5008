//! Exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Scan completed and duplicates were found
/// - 1: Fatal error
/// - 2: Scan completed, no duplicates
/// - 3: Scan completed but some files or directories were skipped
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Scan completed with some non-fatal read errors.
    PartialSuccess = 3,
    /// Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HD000",
            Self::GeneralError => "HD001",
            Self::NoDuplicates => "HD002",
            Self::PartialSuccess => "HD003",
            Self::Interrupted => "HD130",
        }
    }

    /// Exit code for a completed scan.
    ///
    /// Skipped files take precedence over the duplicate count, since the
    /// result may be incomplete.
    #[must_use]
    pub fn for_scan(duplicate_files: usize, had_errors: bool) -> Self {
        if had_errors {
            Self::PartialSuccess
        } else if duplicate_files > 0 {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a fatal error returned from `run_app`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the scan was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
