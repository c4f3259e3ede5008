//! Duplicate detection module.
//!
//! This module provides:
//! - First-seen-wins classification of fingerprinted files ([`classifier`])
//! - The streaming walk, hash and classify pipeline ([`finder`])

pub mod classifier;
pub mod finder;

pub use classifier::{Archive, ClassificationEvent, Classifier, DuplicateGroup};
pub use finder::{
    DuplicateFinder, EventSink, FinderConfig, FinderError, NullSink, ScanEstimate, ScanReport,
    ScanSummary, DEFAULT_BATCH_SIZE, DEFAULT_IO_THREADS,
};
