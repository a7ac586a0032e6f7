//! Progress reporting utilities using indicatif.
//!
//! Batch analysis is strictly sequential, so progress is a single bar that
//! advances once per file: `current / total` is always consistent with the
//! number of files whose analysis has completed.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for sequential batch analysis.
pub trait BatchProgress {
    /// Called once before the first file is analyzed.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of files in the batch
    fn on_batch_start(&self, total: usize);

    /// Called after each file's analysis completes.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of files completed so far (1-based)
    /// * `filename` - Name of the file just analyzed
    fn on_item(&self, current: usize, filename: &str);

    /// Called once after the last file.
    fn on_batch_end(&self);
}

/// Progress sink that reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl BatchProgress for NoProgress {
    fn on_batch_start(&self, _total: usize) {}
    fn on_item(&self, _current: usize, _filename: &str) {}
    fn on_batch_end(&self) {}
}

/// Progress reporter drawing a bar on stderr.
///
/// Nothing is drawn when quiet, for single-file batches, or when stderr is
/// not a terminal.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Examples
    ///
    /// ```
    /// use secview::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }
}

impl BatchProgress for Progress {
    fn on_batch_start(&self, total: usize) {
        if self.quiet || total < 2 {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_prefix("Analyzing");
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_item(&self, current: usize, filename: &str) {
        log::trace!("Batch progress: {} ({})", current, filename);
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                bar.set_position(current as u64);
                bar.set_message(filename.to_string());
            }
        }
    }

    fn on_batch_end(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}
