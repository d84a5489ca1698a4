// file: src/pipeline/progress.rs
// description: stage progress display and run statistics
// reference: uses indicatif for the spinner and tracks per-stage timings

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub raw_chars: usize,
    pub fragment_chars: usize,
    pub books_parsed: usize,
    pub records_skipped: usize,
    pub issues: usize,
    pub backend_ms: u64,
    pub parse_ms: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.backend_ms + self.parse_ms
    }

    /// Share of book-like elements that became records.
    pub fn success_rate(&self) -> f64 {
        let total = self.books_parsed + self.records_skipped;
        if total == 0 {
            return 0.0;
        }
        (self.books_parsed as f64 / total as f64) * 100.0
    }

    /// Fraction of the raw output that was markup.
    pub fn fragment_ratio(&self) -> f64 {
        if self.raw_chars == 0 {
            return 0.0;
        }
        self.fragment_chars as f64 / self.raw_chars as f64
    }
}

/// Spinner for the three pipeline stages. Hidden when output is not colored
/// so piped output stays clean.
pub struct StageProgress {
    bar: ProgressBar,
    total: usize,
}

impl StageProgress {
    pub const STAGES: usize = 3;

    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Failed to create spinner template"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            total: Self::STAGES,
        }
    }

    pub fn stage(&self, step: usize, message: &str) {
        let label = format!("[{}/{}]", step, self.total).cyan().bold();
        self.bar.set_message(format!("{} {}", label, message));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for StageProgress {
    fn drop(&mut self) {
        self.finish();
    }
}
