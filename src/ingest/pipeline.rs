use std::fmt;
use std::time::{Duration, Instant};

use crate::db::HeadlineStore;
use crate::error::Result;
use crate::progress::Progress;
use crate::source::{load_headlines, SourceFile};

use super::accumulator::{batches, Batch};
use super::inserter::{insert_batch, InsertReport};

/// Totals for one import run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportStats {
    pub files_total: usize,
    pub files_processed: usize,
    pub rows_read: usize,
    pub rows_stored: usize,
    pub rows_dropped: usize,
    pub attempts: usize,
    pub elapsed: Duration,
}

impl ImportStats {
    pub fn rows_per_second(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.rows_stored as f64 / secs) as u64
        } else {
            0
        }
    }

    fn record(&mut self, batch: &Batch, report: InsertReport, elapsed: Duration) {
        self.files_processed += batch.files;
        self.rows_read += batch.rows_read;
        self.rows_stored += report.stored;
        self.rows_dropped += report.dropped;
        self.attempts += report.attempts;
        self.elapsed = elapsed;
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Files Processed: {}/{}  Headlines Stored: {} ({} headlines per second)",
            self.files_processed,
            self.files_total,
            self.rows_stored,
            self.rows_per_second()
        )
    }
}

/// Streams source files through the batch accumulator into a headline store.
///
/// Batches are produced and inserted strictly one after another. Feeds referenced by
/// the files must already be in the store.
pub struct Importer<'a, S: ?Sized> {
    store: &'a S,
    cutoff: usize,
    progress: Progress,
}

impl<'a, S> Importer<'a, S>
where
    S: HeadlineStore + ?Sized,
{
    pub fn new(store: &'a S, cutoff: usize) -> Self {
        Self {
            store,
            cutoff,
            progress: Progress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(&self, files: &[SourceFile]) -> Result<ImportStats> {
        let start = Instant::now();
        let mut stats = ImportStats {
            files_total: files.len(),
            ..Default::default()
        };

        for batch in batches(files.iter().map(load_headlines), self.cutoff) {
            let batch = batch?;
            let report = insert_batch(self.store, &batch.rows).await?;
            if !batch.is_empty() {
                tracing::debug!(
                    "Batch of {} rows: {} stored, {} already present, {} attempts",
                    batch.len(),
                    report.stored,
                    report.dropped,
                    report.attempts
                );
            }
            stats.record(&batch, report, start.elapsed());
            self.progress.update(&stats);
        }

        stats.elapsed = start.elapsed();
        self.progress.finish(&stats);
        Ok(stats)
    }
}
