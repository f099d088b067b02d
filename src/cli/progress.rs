use indicatif::{MultiProgress, ProgressBar, ProgressBarIter, ProgressStyle};
use std::io::Read;
use std::time::Duration;

/// A RAII byte progress bar that automatically finishes when dropped.
pub struct UploadProgress<'a> {
    /// The global progress bar collection that's integrated with the logger.
    global_progress: &'a MultiProgress,
    /// The progress bar for this upload.
    bar: ProgressBar,
}

impl<'a> UploadProgress<'a> {
    /// Create a progress bar for `total` bytes, hooked into the global progress
    /// bar collection, which is integrated with the logger.
    pub fn new(global_progress: &'a MultiProgress, total: u64) -> Self {
        let bar = global_progress.add(ProgressBar::new(total));
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} \
                 ({binary_bytes_per_sec}, {eta})",
            )
            .unwrap()
            .progress_chars("=> "),
        );
        bar.set_message("Uploading");
        Self {
            global_progress,
            bar,
        }
    }

    /// Wrap `reader` so every byte read from it advances the bar.
    pub fn wrap_read<R: Read>(&self, reader: R) -> ProgressBarIter<R> {
        self.bar.wrap_read(reader)
    }

    /// Number of bytes read through the bar so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Drop for UploadProgress<'_> {
    fn drop(&mut self) {
        // Clean up the progress bar
        self.bar.finish();
        self.global_progress.remove(&self.bar);
    }
}
