//! The CLI's [`ProgressReporter`] implementation: an `indicatif` bar that
//! tracks the download pool's `(done, total)` counters.

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use pack_cache::ProgressReporter;

pub struct IndicatifProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        IndicatifProgress {
            bar: Mutex::new(None),
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifProgress {
    fn on_progress(&self, message: &str, done: usize, total: usize) {
        let mut bar = self.bar.lock();
        let bar = bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}") {
                pb.set_style(style.progress_chars("=>-"));
            }
            pb.set_message(message.to_string());
            pb
        });

        bar.set_position(done as u64);
        if total > 0 && done >= total {
            bar.finish_and_clear();
        }
    }
}
