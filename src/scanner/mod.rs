//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Deterministic depth-first directory walking using walkdir
//! - Streaming content fingerprints with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Bounded-memory fingerprinting of file contents
//!
//! # Example
//!
//! ```no_run
//! use hashdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;
use std::sync::Arc;

// Re-export main types
pub use hasher::{Fingerprint, Hasher, DEFAULT_CHUNK_SIZE, FINGERPRINT_LEN, MIN_CHUNK_SIZE};
pub use walker::Walker;

/// A regular file discovered during traversal.
///
/// Created by the walker and consumed by the hasher. The size is the one
/// reported by `stat` at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path to the file (root-joined, not canonicalized)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new FileRecord.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Whether the file had no content when it was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Configuration for directory walking.
///
/// Symbolic links are never followed; these options only narrow the set of
/// files that are reported.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Also apply the `.gitignore` found at the root, if any.
    pub respect_gitignore: bool,

    /// Maximum directory depth to descend into (root children are depth 1).
    pub max_depth: Option<usize>,
}

impl WalkerConfig {
    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set the ignore patterns.
    #[must_use]
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Set whether the root `.gitignore` is applied.
    #[must_use]
    pub fn with_respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Set the maximum traversal depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A file could not be fingerprinted.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Path of the entry the error refers to, if known.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::PermissionDenied(path) | Self::Io { path, .. } => Some(path),
            Self::Hash(e) => Some(e.path()),
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug, Clone)]
pub enum HashError {
    /// The specified file was not found (it may have been removed mid-scan).
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),
}

impl HashError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: Arc::new(error),
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path)
            | Self::PermissionDenied(path)
            | Self::Interrupted(path)
            | Self::Io { path, .. } => path,
        }
    }
}
