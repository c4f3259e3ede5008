//! Scan pipeline: walk, hash, classify.
//!
//! # Overview
//!
//! [`DuplicateFinder`] drives a single streaming pass over a directory tree:
//! 1. **Walk** - the [`Walker`] yields regular files in depth-first order
//! 2. **Hash** - each non-empty file is fingerprinted with a bounded buffer
//! 3. **Classify** - the [`Classifier`] labels it original or duplicate and
//!    the resulting [`ClassificationEvent`] is handed to an [`EventSink`]
//!
//! Nothing is buffered beyond one hashing batch, so events reach the sink
//! while the walk is still in progress.
//!
//! # Concurrency
//!
//! With `io_threads == 1` the pipeline is fully sequential. With more
//! threads, records are collected into batches of `batch_size` and hashed on
//! a dedicated rayon pool. Batch results are put back into traversal order
//! before classification, so both modes produce identical events, groups and
//! canonical choices.
//!
//! # Example
//!
//! ```no_run
//! use hashdupe::duplicates::{ClassificationEvent, DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let mut sink = |event: &ClassificationEvent| {
//!     if let ClassificationEvent::DuplicateOf { original_path, duplicate_path, .. } = event {
//!         println!("{} duplicates {}", duplicate_path.display(), original_path.display());
//!     }
//! };
//! let report = finder.scan(Path::new("."), &mut sink).unwrap();
//! println!("Reclaimable: {}", report.summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::classifier::{Archive, ClassificationEvent, Classifier, DuplicateGroup};
use crate::progress::{ProgressCallback, PHASE_ESTIMATE, PHASE_HASHING};
use crate::scanner::{
    FileRecord, Fingerprint, HashError, Hasher, ScanError, Walker, WalkerConfig,
    DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE,
};

/// Default number of records hashed per parallel batch.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Receiver for classification events.
///
/// Events arrive in classification order, one per non-empty file that was
/// hashed successfully.
pub trait EventSink {
    /// Handle one event.
    fn on_event(&mut self, event: &ClassificationEvent);
}

impl EventSink for Vec<ClassificationEvent> {
    fn on_event(&mut self, event: &ClassificationEvent) {
        self.push(event.clone());
    }
}

impl<F> EventSink for F
where
    F: FnMut(&ClassificationEvent),
{
    fn on_event(&mut self, event: &ClassificationEvent) {
        self(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: &ClassificationEvent) {}
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing threads. `1` runs the pipeline sequentially.
    pub io_threads: usize,
    /// Read buffer size per hasher, in bytes.
    pub chunk_size: usize,
    /// Records hashed per batch in parallel mode.
    pub batch_size: usize,
    /// Abort on the first per-file or traversal error.
    pub strict: bool,
    /// Traversal options.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("chunk_size", &self.chunk_size)
            .field("batch_size", &self.batch_size)
            .field("strict", &self.strict)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            strict: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (at least 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the read buffer size (at least 4 KiB).
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(MIN_CHUNK_SIZE);
        self
    }

    /// Set the parallel batch size (at least 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Enable or disable strict mode.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the traversal options.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Regular files reported by the walker, including empty and skipped ones
    pub total_files: usize,
    /// Bytes of all non-empty files that were hashed successfully
    pub total_bytes: u64,
    /// Sum of the sizes of every duplicate file
    pub reclaimable_bytes: u64,
    /// Number of fingerprints with at least one duplicate
    pub group_count: usize,
    /// Number of files classified as duplicates
    pub duplicate_files: usize,
    /// Zero-length files, which are never hashed or classified
    pub empty_files: usize,
    /// Files that could not be read and were left out
    pub skipped_files: usize,
    /// Traversal errors (unreadable directories, loops, stat failures)
    pub walk_errors: usize,
    /// Every non-fatal error, in the order it was encountered
    pub errors: Vec<ScanError>,
    /// Wall-clock duration of the scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Percentage of hashed bytes occupied by duplicates.
    #[must_use]
    pub fn reclaimable_percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.reclaimable_bytes as f64 / self.total_bytes as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_bytes).to_string()
    }

    /// Hashed bytes as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_bytes).to_string()
    }

    /// Whether any file or directory was left out because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Result of the size pre-pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanEstimate {
    /// Regular files found
    pub files: usize,
    /// Sum of their sizes
    pub bytes: u64,
}

/// Everything a completed scan produced.
#[derive(Debug)]
pub struct ScanReport {
    /// Counters and errors
    pub summary: ScanSummary,
    /// Duplicate groups in the order their first duplicate was found
    pub groups: Vec<DuplicateGroup>,
    /// Fingerprint to canonical path for every classified file
    pub archive: Archive,
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The hashing thread pool could not be created.
    #[error("Failed to start hashing threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A per-file or traversal error in strict mode.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Mutable state threaded through one scan.
struct ScanState {
    classifier: Classifier,
    summary: ScanSummary,
    processed: usize,
}

/// Duplicate finder that runs the walk, hash and classify pipeline.
///
/// # Example
///
/// ```no_run
/// use hashdupe::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::with_defaults();
/// let (groups, summary) = finder.find_duplicates(Path::new(".")).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn validate_root(root: &Path) -> Result<(), FinderError> {
        if !root.exists() {
            return Err(FinderError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FinderError::NotADirectory(root.to_path_buf()));
        }
        Ok(())
    }

    fn walker(&self, root: &Path) -> Walker {
        let walker = Walker::new(root, self.config.walker_config.clone());
        match &self.config.shutdown_flag {
            Some(flag) => walker.with_shutdown_flag(flag.clone()),
            None => walker,
        }
    }

    fn hasher(&self) -> Hasher {
        let hasher = Hasher::with_chunk_size(self.config.chunk_size);
        match &self.config.shutdown_flag {
            Some(flag) => hasher.with_shutdown_flag(flag.clone()),
            None => hasher,
        }
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping scan");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }

    /// Sum the sizes of every file the scan would visit.
    ///
    /// Only used to size the hashing progress bar. Traversal errors are
    /// ignored here; the scan itself reports them.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the root is missing or not a directory, or
    /// if shutdown is requested.
    pub fn estimate(&self, root: &Path) -> Result<ScanEstimate, FinderError> {
        Self::validate_root(root)?;

        let progress = self.config.progress_callback.as_ref();
        if let Some(cb) = progress {
            cb.on_phase_start(PHASE_ESTIMATE, 0);
        }

        let mut estimate = ScanEstimate::default();
        for record in self.walker(root).walk().filter_map(Result::ok) {
            estimate.files += 1;
            estimate.bytes += record.size;
            if let Some(cb) = progress {
                cb.on_progress(estimate.files, &record.path.to_string_lossy());
            }
        }

        if let Some(cb) = progress {
            cb.on_phase_end(PHASE_ESTIMATE);
        }
        self.check_shutdown()?;

        log::debug!(
            "Estimate: {} files, {}",
            estimate.files,
            ByteSize(estimate.bytes)
        );
        Ok(estimate)
    }

    /// Scan `root` and stream every classification event to `sink`.
    ///
    /// Events are delivered in traversal order regardless of `io_threads`.
    /// Unreadable files and directories are logged, counted in the summary
    /// and skipped, unless strict mode is on.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The root does not exist or is not a directory
    /// - Shutdown is requested
    /// - Strict mode is on and any file or directory cannot be read
    pub fn scan<S>(&self, root: &Path, sink: &mut S) -> Result<ScanReport, FinderError>
    where
        S: EventSink + ?Sized,
    {
        let start = Instant::now();
        Self::validate_root(root)?;
        self.check_shutdown()?;

        log::info!(
            "Scanning {} ({} hashing thread{})",
            root.display(),
            self.config.io_threads,
            if self.config.io_threads == 1 { "" } else { "s" }
        );

        let progress = self.config.progress_callback.clone();
        if let Some(cb) = &progress {
            let estimate = self.estimate(root)?;
            cb.on_phase_start(PHASE_HASHING, estimate.bytes);
        }

        let mut state = ScanState {
            classifier: Classifier::new(),
            summary: ScanSummary::default(),
            processed: 0,
        };

        if self.config.io_threads <= 1 {
            self.run_sequential(root, &mut state, sink)?;
        } else {
            self.run_parallel(root, &mut state, sink)?;
        }

        if let Some(cb) = &progress {
            cb.on_phase_end(PHASE_HASHING);
        }

        let ScanState {
            classifier,
            mut summary,
            ..
        } = state;
        summary.total_bytes = classifier.classified_bytes();
        summary.reclaimable_bytes = classifier.reclaimable_bytes();
        summary.group_count = classifier.group_count();
        summary.duplicate_files = classifier.duplicate_files();
        summary.scan_duration = start.elapsed();

        log::info!(
            "Scan complete: {} files, {} duplicates in {} groups, {} reclaimable ({:.2?})",
            summary.total_files,
            summary.duplicate_files,
            summary.group_count,
            summary.reclaimable_display(),
            summary.scan_duration
        );
        if summary.has_errors() {
            log::warn!(
                "{} files skipped, {} traversal errors",
                summary.skipped_files,
                summary.walk_errors
            );
        }

        let (archive, groups) = classifier.into_parts();
        Ok(ScanReport {
            summary,
            groups,
            archive,
        })
    }

    /// Scan `root` and return only the duplicate groups and summary.
    ///
    /// # Errors
    ///
    /// Same as [`DuplicateFinder::scan`].
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let report = self.scan(root, &mut NullSink)?;
        Ok((report.groups, report.summary))
    }

    fn run_sequential<S>(
        &self,
        root: &Path,
        state: &mut ScanState,
        sink: &mut S,
    ) -> Result<(), FinderError>
    where
        S: EventSink + ?Sized,
    {
        let walker = self.walker(root);
        let mut hasher = self.hasher();

        for item in walker.walk() {
            self.check_shutdown()?;
            let Some(record) = self.admit(state, item)? else {
                continue;
            };
            let result = self.hash_record(&mut hasher, &record);
            self.accept(state, record, result, sink)?;
        }

        self.check_shutdown()
    }

    fn run_parallel<S>(
        &self,
        root: &Path,
        state: &mut ScanState,
        sink: &mut S,
    ) -> Result<(), FinderError>
    where
        S: EventSink + ?Sized,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let walker = self.walker(root);
        let mut items = walker.walk();
        let batch_size = self.config.batch_size.max(1);
        let mut batch: Vec<FileRecord> = Vec::with_capacity(batch_size);
        let mut exhausted = false;

        while !exhausted {
            while batch.len() < batch_size {
                let Some(item) = items.next() else {
                    exhausted = true;
                    break;
                };
                if let Some(record) = self.admit(state, item)? {
                    batch.push(record);
                }
            }
            self.check_shutdown()?;

            if batch.is_empty() {
                continue;
            }
            log::trace!("Hashing batch of {} files", batch.len());

            let results: Vec<Result<Fingerprint, HashError>> = pool.install(|| {
                batch
                    .par_iter()
                    .map_init(
                        || self.hasher(),
                        |hasher, record| self.hash_record(hasher, record),
                    )
                    .collect()
            });

            for (record, result) in batch.drain(..).zip(results) {
                self.accept(state, record, result, sink)?;
            }
        }

        self.check_shutdown()
    }

    fn hash_record(
        &self,
        hasher: &mut Hasher,
        record: &FileRecord,
    ) -> Result<Fingerprint, HashError> {
        let progress = self.config.progress_callback.as_ref();
        hasher
            .hash_with_progress(&record.path, |n| {
                if let Some(cb) = progress {
                    cb.on_bytes(n as u64);
                }
            })
            .map(|(fingerprint, _)| fingerprint)
    }

    /// Count a walker result and decide whether it needs hashing.
    fn admit(
        &self,
        state: &mut ScanState,
        item: Result<FileRecord, ScanError>,
    ) -> Result<Option<FileRecord>, FinderError> {
        match item {
            Ok(record) => {
                state.summary.total_files += 1;
                if record.is_empty() {
                    log::trace!("Skipping empty file {}", record.path.display());
                    state.summary.empty_files += 1;
                    return Ok(None);
                }
                Ok(Some(record))
            }
            Err(error) => {
                if self.config.strict {
                    return Err(FinderError::Scan(error));
                }
                state.summary.walk_errors += 1;
                state.summary.errors.push(error);
                Ok(None)
            }
        }
    }

    /// Classify a hashed record, or account for the failure.
    fn accept<S>(
        &self,
        state: &mut ScanState,
        record: FileRecord,
        result: Result<Fingerprint, HashError>,
        sink: &mut S,
    ) -> Result<(), FinderError>
    where
        S: EventSink + ?Sized,
    {
        state.processed += 1;
        if let Some(cb) = &self.config.progress_callback {
            cb.on_progress(state.processed, &record.path.to_string_lossy());
        }

        match result {
            Ok(fingerprint) => {
                let event = state.classifier.classify(record, fingerprint);
                if let ClassificationEvent::DuplicateOf {
                    original_path,
                    duplicate_path,
                    ..
                } = &event
                {
                    log::debug!(
                        "{} duplicates {}",
                        duplicate_path.display(),
                        original_path.display()
                    );
                }
                sink.on_event(&event);
                Ok(())
            }
            Err(HashError::Interrupted(_)) => Err(FinderError::Interrupted),
            Err(error) => {
                log::warn!("Skipping {}: {}", record.path.display(), error);
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_message(&format!("Skipped {}", record.path.display()));
                }
                if self.config.strict {
                    return Err(FinderError::Scan(error.into()));
                }
                state.summary.skipped_files += 1;
                state.summary.errors.push(error.into());
                Ok(())
            }
        }
    }
}
