//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and reporting every regular file with its size. Traversal is
//! depth-first with the entries of each directory sorted by file name, so a
//! given tree always produces the same sequence within one invocation. The
//! duplicate classifier relies on that order to pick canonical files.
//!
//! # Features
//!
//! - Iterative traversal (walkdir keeps an explicit stack of open directories)
//! - Symbolic links are never followed and never reported
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering and depth limit
//! - Entries that vanish mid-walk are skipped silently
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use hashdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for deterministic file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hashdupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and, when enabled, the
    /// root `.gitignore`.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if self.config.respect_gitignore && gitignore_path.is_file() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a path should be ignored based on configured patterns.
    fn should_ignore(&self, path: &Path, is_dir: bool, gitignore: Option<&Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };

        // Patterns are matched against the root-relative path, which lets
        // `dir/**` style patterns exclude whole subtrees.
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched_path_or_any_parents(relative_path, is_dir)
            .is_ignore()
    }

    /// Whether an entry below the root is hidden.
    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Returns an iterator over [`FileRecord`] results in traversal order.
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Entries that disappear between listing and `stat` produce
    /// nothing at all.
    ///
    /// Empty files are yielded like any other file; deciding what to do with
    /// them is up to the caller.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use hashdupe::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let skip_hidden = self.config.skip_hidden;

        let mut walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }

        let mut entries = walk_dir.into_iter();
        let mut stopped = false;

        std::iter::from_fn(move || loop {
            if stopped {
                return None;
            }
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                stopped = true;
                return None;
            }

            let entry = match entries.next()? {
                Ok(entry) => entry,
                Err(e) => match self.handle_walk_error(e) {
                    Some(err) => return Some(Err(err)),
                    None => continue,
                },
            };

            let file_type = entry.file_type();

            if file_type.is_dir() {
                if entry.depth() == 0 {
                    continue;
                }
                let hidden = skip_hidden && Self::is_hidden(&entry);
                if hidden || self.should_ignore(entry.path(), true, gitignore.as_ref()) {
                    log::trace!("Pruning directory: {}", entry.path().display());
                    entries.skip_current_dir();
                }
                continue;
            }

            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }

            if !file_type.is_file() {
                log::trace!("Skipping special file: {}", entry.path().display());
                continue;
            }

            if skip_hidden && Self::is_hidden(&entry) {
                continue;
            }

            if self.should_ignore(entry.path(), false, gitignore.as_ref()) {
                log::trace!("Ignoring file: {}", entry.path().display());
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    return Some(Ok(FileRecord::new(entry.into_path(), metadata.len())));
                }
                Err(e) => match self.handle_walk_error(e) {
                    Some(err) => return Some(Err(err)),
                    None => continue,
                },
            }
        })
    }

    /// Convert a walkdir error into a [`ScanError`], or `None` for vanished entries.
    fn handle_walk_error(&self, error: walkdir::Error) -> Option<ScanError> {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        match error.io_error().map(std::io::Error::kind) {
            Some(ErrorKind::NotFound) => {
                log::debug!(
                    "Entry vanished during traversal (skipping): {}",
                    path.display()
                );
                None
            }
            Some(ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                Some(ScanError::PermissionDenied(path))
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                let source = error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                Some(ScanError::Io {
                    path,
                    source: Arc::new(source),
                })
            }
        }
    }
}
