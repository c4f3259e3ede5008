//! First-seen-wins duplicate classification.
//!
//! # Overview
//!
//! The [`Classifier`] consumes `(record, fingerprint)` pairs in traversal
//! order. The first file seen with a fingerprint becomes its canonical
//! original and is recorded in the [`Archive`]; every later file with the
//! same fingerprint is a duplicate of that original and is appended to the
//! fingerprint's [`DuplicateGroup`].
//!
//! The canonical choice is never revisited, so the outcome is fully
//! determined by the order in which records are classified.
//!
//! # Example
//!
//! ```
//! use hashdupe::duplicates::{ClassificationEvent, Classifier};
//! use hashdupe::scanner::{FileRecord, Fingerprint};
//! use std::path::PathBuf;
//!
//! let mut classifier = Classifier::new();
//! let x = Fingerprint::of(b"X");
//!
//! let first = classifier.classify(FileRecord::new(PathBuf::from("a"), 1), x);
//! let second = classifier.classify(FileRecord::new(PathBuf::from("b"), 1), x);
//!
//! assert!(matches!(first, ClassificationEvent::Original { .. }));
//! assert!(second.is_duplicate());
//! assert_eq!(classifier.reclaimable_bytes(), 1);
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{FileRecord, Fingerprint};

/// Outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationEvent {
    /// First file observed with this fingerprint.
    Original {
        /// Path of the canonical file
        path: PathBuf,
        /// Content fingerprint
        fingerprint: Fingerprint,
        /// File size in bytes
        size: u64,
    },
    /// A later file whose content matches an earlier original.
    DuplicateOf {
        /// Canonical file this one duplicates
        original_path: PathBuf,
        /// Path of the duplicate
        duplicate_path: PathBuf,
        /// Shared content fingerprint
        fingerprint: Fingerprint,
        /// Size of the duplicate in bytes
        size: u64,
    },
}

impl ClassificationEvent {
    /// Path of the file this event classifies.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Original { path, .. } => path,
            Self::DuplicateOf { duplicate_path, .. } => duplicate_path,
        }
    }

    /// Fingerprint of the classified file.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Original { fingerprint, .. } | Self::DuplicateOf { fingerprint, .. } => {
                *fingerprint
            }
        }
    }

    /// Size of the classified file.
    #[must_use]
    pub fn size(&self) -> u64 {
        match self {
            Self::Original { size, .. } | Self::DuplicateOf { size, .. } => *size,
        }
    }

    /// Whether the file was classified as a duplicate.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateOf { .. })
    }
}

/// Fingerprint to canonical path table for one scan.
///
/// Entries are only ever added; an existing entry is never replaced.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    entries: HashMap<Fingerprint, PathBuf>,
}

impl Archive {
    /// Create an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `fingerprint`, inserting `path` as its canonical file if unseen.
    ///
    /// Returns the existing canonical path, or `None` if `path` was just
    /// recorded. The lookup and the insert are one map operation.
    pub fn lookup_or_insert(&mut self, fingerprint: Fingerprint, path: &Path) -> Option<&Path> {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(entry) => Some(entry.into_mut().as_path()),
            Entry::Vacant(entry) => {
                entry.insert(path.to_path_buf());
                None
            }
        }
    }

    /// Canonical path for `fingerprint`, if any.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.entries.get(fingerprint).map(PathBuf::as_path)
    }

    /// Whether `fingerprint` has been seen.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Number of distinct fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no fingerprint has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(fingerprint, canonical path)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &Path)> {
        self.entries.iter().map(|(k, v)| (k, v.as_path()))
    }
}

/// A canonical file and the duplicates discovered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared content fingerprint
    pub fingerprint: Fingerprint,
    /// Size of each file in bytes
    pub size: u64,
    /// The canonical (first-seen) file
    pub original: PathBuf,
    /// Duplicates in discovery order
    pub duplicates: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group with no duplicates yet.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, size: u64, original: PathBuf) -> Self {
        Self {
            fingerprint,
            size,
            original,
            duplicates: Vec::new(),
        }
    }

    /// Number of files in the group, original included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.duplicates.len()
    }

    /// Always false: a group contains at least its original.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Bytes freed by removing every duplicate.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }

    /// Original followed by duplicates.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.original.as_path()).chain(self.duplicates.iter().map(PathBuf::as_path))
    }
}

/// Stateful first-seen-wins classifier.
///
/// Owns the archive and the duplicate groups of one scan. It takes `&mut
/// self`, so concurrent hashing has to funnel results through a single owner
/// before classification.
#[derive(Debug, Default)]
pub struct Classifier {
    archive: Archive,
    groups: Vec<DuplicateGroup>,
    group_index: HashMap<Fingerprint, usize>,
    classified_bytes: u64,
    duplicate_files: usize,
    reclaimable_bytes: u64,
}

impl Classifier {
    /// Create a classifier with an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one hashed file.
    ///
    /// Callers must not pass empty files; those never enter the archive.
    pub fn classify(&mut self, record: FileRecord, fingerprint: Fingerprint) -> ClassificationEvent {
        debug_assert!(!record.is_empty(), "empty files are never classified");

        self.classified_bytes += record.size;

        let Some(original) = self.archive.lookup_or_insert(fingerprint, &record.path) else {
            return ClassificationEvent::Original {
                path: record.path,
                fingerprint,
                size: record.size,
            };
        };
        let original = original.to_path_buf();

        self.duplicate_files += 1;
        self.reclaimable_bytes += record.size;

        let idx = match self.group_index.entry(fingerprint) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                self.groups
                    .push(DuplicateGroup::new(fingerprint, record.size, original.clone()));
                *entry.insert(self.groups.len() - 1)
            }
        };
        self.groups[idx].duplicates.push(record.path.clone());

        ClassificationEvent::DuplicateOf {
            original_path: original,
            duplicate_path: record.path,
            fingerprint,
            size: record.size,
        }
    }

    /// The fingerprint table built so far.
    #[must_use]
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Duplicate groups, ordered by discovery of their first duplicate.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Total size of all classified files.
    #[must_use]
    pub fn classified_bytes(&self) -> u64 {
        self.classified_bytes
    }

    /// Number of files classified as duplicates.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.duplicate_files
    }

    /// Total size of all files classified as duplicates.
    #[must_use]
    pub fn reclaimable_bytes(&self) -> u64 {
        self.reclaimable_bytes
    }

    /// Number of fingerprints with at least one duplicate.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Consume the classifier, returning the archive and the groups.
    #[must_use]
    pub fn into_parts(self) -> (Archive, Vec<DuplicateGroup>) {
        (self.archive, self.groups)
    }
}
