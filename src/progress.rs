//! Progress reporting for the scan pipeline.
//!
//! The core only talks to the [`ProgressCallback`] trait and never writes to
//! the terminal itself. [`Progress`] is the indicatif-backed implementation
//! used by the command-line front end.
//!
//! # Phases
//!
//! - [`PHASE_ESTIMATE`]: pre-pass summing file sizes; `total` is 0 (unknown)
//! - [`PHASE_HASHING`]: fingerprinting; `total` is the estimated byte count

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Name of the size-estimation pre-pass.
pub const PHASE_ESTIMATE: &str = "estimate";

/// Name of the hashing phase.
pub const PHASE_HASHING: &str = "hashing";

/// Progress callback for scan phases.
///
/// Implement this trait to receive progress updates during the scan.
/// Callbacks may be invoked from hashing worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase ([`PHASE_ESTIMATE`] or [`PHASE_HASHING`])
    /// * `total` - Expected amount of work (bytes for hashing, 0 if unknown)
    fn on_phase_start(&self, phase: &str, total: u64);

    /// Called once per file that finished processing.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of files processed so far (1-based)
    /// * `path` - Path that was just processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called for every chunk of file content read during hashing.
    fn on_bytes(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called with a short status line, e.g. when a file is skipped.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
///
/// Draws a spinner while estimating and a byte-based bar with throughput
/// while hashing. All output goes to stderr.
pub struct Progress {
    multi: MultiProgress,
    estimate: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
}

impl Progress {
    /// Create a new progress reporter drawing to stderr.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashdupe::progress::Progress;
    ///
    /// let progress = Progress::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            estimate: Mutex::new(None),
            hashing: Mutex::new(None),
        }
    }

    fn estimate_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn hashing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:40.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} {bytes_per_sec} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_active<F: FnOnce(&ProgressBar)>(&self, f: F) {
        if let Ok(guard) = self.hashing.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
                return;
            }
        }
        if let Ok(guard) = self.estimate.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: u64) {
        match phase {
            PHASE_ESTIMATE => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::estimate_style());
                pb.set_message("Computing total size");
                pb.enable_steady_tick(Duration::from_millis(100));
                if let Ok(mut slot) = self.estimate.lock() {
                    *slot = Some(pb);
                }
            }
            PHASE_HASHING => {
                let pb = self.multi.add(ProgressBar::new(total));
                pb.set_style(Self::hashing_style());
                pb.set_message("Hashing files");
                if let Ok(mut slot) = self.hashing.lock() {
                    *slot = Some(pb);
                }
            }
            other => log::debug!("Ignoring unknown progress phase '{}'", other),
        }
    }

    fn on_progress(&self, current: usize, _path: &str) {
        // Only the spinner counts files; the hashing bar is driven by bytes
        if let Ok(guard) = self.estimate.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(current as u64);
            }
        }
    }

    fn on_bytes(&self, bytes: u64) {
        if let Ok(guard) = self.hashing.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(bytes);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        let (slot, message) = match phase {
            PHASE_ESTIMATE => (&self.estimate, "Size estimate complete"),
            PHASE_HASHING => (&self.hashing, "Hashing complete"),
            _ => return,
        };
        if let Ok(mut guard) = slot.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_with_message(message);
            }
        }
    }

    fn on_message(&self, message: &str) {
        let message = message.to_string();
        self.with_active(|pb| pb.set_message(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden() -> Progress {
        Progress::with_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn test_estimate_spinner_counts_files() {
        let progress = hidden();
        progress.on_phase_start(PHASE_ESTIMATE, 0);
        progress.on_progress(3, "/some/file");

        let position = progress
            .estimate
            .lock()
            .unwrap()
            .as_ref()
            .map(ProgressBar::position);
        assert_eq!(position, Some(3));

        progress.on_phase_end(PHASE_ESTIMATE);
        assert!(progress.estimate.lock().unwrap().is_none());
    }

    #[test]
    fn test_message_goes_to_active_bar() {
        let progress = hidden();
        progress.on_phase_start(PHASE_ESTIMATE, 0);
        progress.on_phase_start(PHASE_HASHING, 100);
        progress.on_message("Skipped /data/locked");

        let hashing = progress.hashing.lock().unwrap().as_ref().map(ProgressBar::message);
        let estimate = progress.estimate.lock().unwrap().as_ref().map(ProgressBar::message);
        assert_eq!(hashing.as_deref(), Some("Skipped /data/locked"));
        assert_eq!(estimate.as_deref(), Some("Computing total size"));
    }

    #[test]
    fn test_message_without_bars_is_ignored() {
        let progress = hidden();
        progress.on_message("nothing to show");
        assert!(progress.hashing.lock().unwrap().is_none());
    }

    #[test]
    fn test_hashing_bar_tracks_bytes() {
        let progress = hidden();

        progress.on_phase_start(PHASE_HASHING, 1000);
        progress.on_bytes(300);
        progress.on_bytes(200);

        let position = progress
            .hashing
            .lock()
            .unwrap()
            .as_ref()
            .map(ProgressBar::position);
        assert_eq!(position, Some(500));

        progress.on_phase_end(PHASE_HASHING);
        assert!(progress.hashing.lock().unwrap().is_none());
    }

    #[test]
    fn test_progress_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Progress>();
    }
}
