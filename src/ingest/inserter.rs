use std::ops::Range;

use crate::db::{HeadlineStore, StoreError};
use crate::error::Result;
use crate::models::Headline;

/// Counts from inserting one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InsertReport {
    /// Rows newly committed.
    pub stored: usize,
    /// Rows skipped because their key was already in the store.
    pub dropped: usize,
    /// Bulk insert calls issued, successful or not.
    pub attempts: usize,
}

/// Insert `rows`, skipping those whose natural key the store already holds.
///
/// The whole slice is tried first. A uniqueness violation splits the failing range in
/// half, first ⌊n/2⌋ rows then the rest, until each range either commits or is a
/// single conflicting row, which is dropped. Any other store error is returned at once;
/// ranges committed before it stay committed.
pub async fn insert_batch<S>(store: &S, rows: &[Headline]) -> Result<InsertReport>
where
    S: HeadlineStore + ?Sized,
{
    let mut report = InsertReport::default();
    if rows.is_empty() {
        return Ok(report);
    }

    let mut stack: Vec<Range<usize>> = vec![0..rows.len()];
    while let Some(range) = stack.pop() {
        report.attempts += 1;
        match store.bulk_insert(&rows[range.clone()]).await {
            Ok(()) => report.stored += range.len(),
            Err(StoreError::UniquenessViolation) if range.len() <= 1 => {
                report.dropped += range.len();
            }
            Err(StoreError::UniquenessViolation) => {
                let mid = range.start + range.len() / 2;
                tracing::debug!(
                    "Conflict in rows {}..{}, splitting at {}",
                    range.start,
                    range.end,
                    mid
                );
                // Second half pushed first so the first half is tried first.
                stack.push(mid..range.end);
                stack.push(range.start..mid);
            }
            Err(StoreError::Other(e)) => return Err(e),
        }
    }

    Ok(report)
}
