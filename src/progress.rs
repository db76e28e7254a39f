//! Terminal progress for an import run.

use indicatif::{ProgressBar, ProgressStyle};

use crate::ingest::ImportStats;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}";

pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(total_files: usize) -> Self {
        let bar = ProgressBar::new(total_files as u64);
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ ");
        bar.set_style(style);
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn update(&self, stats: &ImportStats) {
        self.bar.set_position(stats.files_processed as u64);
        self.bar.set_message(stats.to_string());
    }

    pub fn finish(&self, stats: &ImportStats) {
        self.bar.finish_with_message(stats.to_string());
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::hidden()
    }
}
