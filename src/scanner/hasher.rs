//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing content
//! [`Fingerprint`]s of files using fixed-size chunked reads. A hasher owns
//! one chunk buffer and reuses it for every file it hashes, so memory use is
//! bounded by the chunk size no matter how large the input is.
//!
//! Fingerprints are the first 128 bits of the BLAKE3 extended output.
//!
//! # Example
//!
//! ```no_run
//! use hashdupe::scanner::Hasher;
//! use std::path::Path;
//!
//! let mut hasher = Hasher::new();
//! let fingerprint = hasher.hash(Path::new("some/file.bin")).unwrap();
//! println!("{fingerprint}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::HashError;

/// Width of a fingerprint in bytes (128 bits).
pub const FINGERPRINT_LEN: usize = 16;

/// Default read chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest accepted read chunk size (4 KiB).
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Fixed-width content hash used as the identity of a file's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Wrap raw fingerprint bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Fingerprint of an in-memory buffer.
    ///
    /// Produces the same value as hashing a file with the same content.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        let mut state = blake3::Hasher::new();
        state.update(data);
        Self::finish(&state)
    }

    fn finish(state: &blake3::Hasher) -> Self {
        let mut out = [0u8; FINGERPRINT_LEN];
        state.finalize_xof().fill(&mut out);
        Self(out)
    }

    /// Raw fingerprint bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hexadecimal representation (32 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of draining a reader through the chunk buffer.
enum Drained {
    Complete(Fingerprint, u64),
    Interrupted,
}

/// Streaming content hasher with a reusable chunk buffer.
///
/// A `Hasher` is not shared between threads; parallel hashing gives each
/// worker its own instance.
#[derive(Debug)]
pub struct Hasher {
    buffer: Vec<u8>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 64 KiB chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a hasher reading `chunk_size` bytes at a time.
    ///
    /// Values below [`MIN_CHUNK_SIZE`] are raised to it.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            buffer: vec![0u8; chunk_size.max(MIN_CHUNK_SIZE)],
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag; a set flag stops the read loop between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Size of the read buffer in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the fingerprint of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened, a read fails
    /// partway through, or shutdown was requested. No fingerprint is ever
    /// produced from a partial read.
    pub fn hash(&mut self, path: &Path) -> Result<Fingerprint, HashError> {
        self.hash_with_len(path).map(|(fingerprint, _)| fingerprint)
    }

    /// Compute the fingerprint of the file at `path` and the number of bytes read.
    ///
    /// # Errors
    ///
    /// See [`Hasher::hash`].
    pub fn hash_with_len(&mut self, path: &Path) -> Result<(Fingerprint, u64), HashError> {
        self.hash_with_progress(path, |_| {})
    }

    /// Like [`Hasher::hash_with_len`], calling `on_chunk` with the length of every chunk read.
    ///
    /// # Errors
    ///
    /// See [`Hasher::hash`].
    pub fn hash_with_progress<F>(
        &mut self,
        path: &Path,
        on_chunk: F,
    ) -> Result<(Fingerprint, u64), HashError>
    where
        F: FnMut(usize),
    {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        match self.drain(file, true, on_chunk) {
            Ok(Drained::Complete(fingerprint, len)) => {
                log::trace!("Hashed {} ({} bytes): {}", path.display(), len, fingerprint);
                Ok((fingerprint, len))
            }
            Ok(Drained::Interrupted) => Err(HashError::Interrupted(path.to_path_buf())),
            Err(e) => Err(HashError::from_io(path, e)),
        }
    }

    /// Compute the fingerprint of everything readable from `reader`.
    ///
    /// Ignores the shutdown flag.
    ///
    /// # Errors
    ///
    /// Returns the first non-`Interrupted` I/O error raised by the reader.
    pub fn hash_reader<R: Read>(&mut self, reader: R) -> std::io::Result<Fingerprint> {
        match self.drain(reader, false, |_| {})? {
            Drained::Complete(fingerprint, _) => Ok(fingerprint),
            Drained::Interrupted => Err(std::io::Error::new(
                ErrorKind::Interrupted,
                "hashing interrupted",
            )),
        }
    }

    /// Bounded read loop; a zero-length read marks end of stream.
    fn drain<R, F>(
        &mut self,
        mut reader: R,
        honor_shutdown: bool,
        mut on_chunk: F,
    ) -> std::io::Result<Drained>
    where
        R: Read,
        F: FnMut(usize),
    {
        let mut state = blake3::Hasher::new();
        let mut total: u64 = 0;

        loop {
            if honor_shutdown && self.is_shutdown_requested() {
                return Ok(Drained::Interrupted);
            }

            let n = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            state.update(&self.buffer[..n]);
            total += n as u64;
            on_chunk(n);
        }

        Ok(Drained::Complete(Fingerprint::finish(&state), total))
    }
}
