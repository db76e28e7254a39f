use std::collections::HashSet;
use std::iter::Peekable;

use crate::models::Headline;

/// A deduplicated group of headlines ready to be inserted as one unit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    pub rows: Vec<Headline>,
    /// Source chunks folded into this batch, carry-overs included.
    pub files: usize,
    /// Rows read before deduplication.
    pub rows_read: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Groups source chunks into batches of roughly `cutoff` rows.
///
/// Chunks are buffered until their raw row count exceeds `cutoff`. The buffer is then
/// deduplicated; if it shrank below `cutoff` it is carried forward to merge with the
/// next chunks, otherwise it is flushed. [`Accumulator::finish`] flushes whatever is
/// left, however small.
#[derive(Debug)]
pub struct Accumulator {
    cutoff: usize,
    pending: Vec<Headline>,
    size: usize,
    files: usize,
    rows_read: usize,
}

impl Accumulator {
    pub fn new(cutoff: usize) -> Self {
        Self {
            cutoff,
            pending: Vec::new(),
            size: 0,
            files: 0,
            rows_read: 0,
        }
    }

    /// Add one source chunk, returning a batch if the buffer crossed the cutoff and
    /// stayed at or above it after deduplication.
    pub fn push(&mut self, chunk: Vec<Headline>) -> Option<Batch> {
        self.size += chunk.len();
        self.rows_read += chunk.len();
        self.files += 1;
        self.pending.extend(chunk);

        if self.size <= self.cutoff {
            return None;
        }

        dedup(&mut self.pending);
        if self.pending.len() < self.cutoff {
            tracing::debug!(
                "Carrying {} deduplicated rows forward (cutoff {})",
                self.pending.len(),
                self.cutoff
            );
            self.size = self.pending.len();
            return None;
        }

        Some(self.take())
    }

    /// Flush the remaining rows at end of input. Returns `None` only when nothing was
    /// pushed since the last flush.
    pub fn finish(mut self) -> Option<Batch> {
        if self.files == 0 {
            return None;
        }
        dedup(&mut self.pending);
        Some(self.take())
    }

    fn take(&mut self) -> Batch {
        let batch = Batch {
            rows: std::mem::take(&mut self.pending),
            files: std::mem::take(&mut self.files),
            rows_read: std::mem::take(&mut self.rows_read),
        };
        self.size = 0;
        tracing::debug!(
            "Flushing batch of {} rows from {} files",
            batch.len(),
            batch.files
        );
        batch
    }
}

/// Remove repeated rows, keeping the first occurrence of each.
fn dedup(rows: &mut Vec<Headline>) {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.retain(|row| seen.insert(row.clone()));
}

/// Lazy batching over an iterator of fallibly loaded source chunks.
///
/// A chunk error is yielded as-is and ends the sequence.
pub struct Batches<I: Iterator> {
    chunks: Peekable<I>,
    accumulator: Option<Accumulator>,
}

pub fn batches<I, E>(chunks: I, cutoff: usize) -> Batches<I::IntoIter>
where
    I: IntoIterator<Item = Result<Vec<Headline>, E>>,
{
    Batches {
        chunks: chunks.into_iter().peekable(),
        accumulator: Some(Accumulator::new(cutoff)),
    }
}

impl<I, E> Iterator for Batches<I>
where
    I: Iterator<Item = Result<Vec<Headline>, E>>,
{
    type Item = Result<Batch, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let accumulator = self.accumulator.as_mut()?;
        while let Some(chunk) = self.chunks.next() {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.accumulator = None;
                    return Some(Err(e));
                }
            };
            if let Some(batch) = accumulator.push(chunk) {
                return Some(Ok(batch));
            }
            if self.chunks.peek().is_none() {
                break;
            }
        }
        self.accumulator.take()?.finish().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn row(title: &str) -> Headline {
        Headline {
            url: "https://example.com/rss".to_string(),
            date: "2021-03-04 05:06:07".to_string(),
            title: title.to_string(),
            description: None,
        }
    }

    fn chunk(titles: &[&str]) -> Vec<Headline> {
        titles.iter().map(|t| row(t)).collect()
    }

    fn collect(chunks: Vec<Vec<Headline>>, cutoff: usize) -> Vec<Batch> {
        batches(chunks.into_iter().map(Ok::<_, Infallible>), cutoff)
            .map(|batch| batch.unwrap())
            .collect()
    }

    fn titles(batch: &Batch) -> Vec<&str> {
        batch.rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn small_chunks_accumulate_until_cutoff_is_exceeded() {
        let mut acc = Accumulator::new(3);

        assert!(acc.push(chunk(&["a", "b"])).is_none());
        let batch = acc.push(chunk(&["c", "d"])).unwrap();

        assert_eq!(titles(&batch), ["a", "b", "c", "d"]);
        assert_eq!(batch.files, 2);
        assert_eq!(batch.rows_read, 4);
        assert!(acc.finish().is_none());
    }

    #[test]
    fn chunk_equal_to_cutoff_does_not_flush() {
        let mut acc = Accumulator::new(2);

        assert!(acc.push(chunk(&["a", "b"])).is_none());
        assert_eq!(titles(&acc.finish().unwrap()), ["a", "b"]);
    }

    #[test]
    fn undersized_result_after_dedup_is_carried_forward() {
        let mut acc = Accumulator::new(3);

        assert!(acc.push(chunk(&["a", "a", "a", "b"])).is_none());
        let batch = acc.push(chunk(&["c", "d"])).unwrap();

        assert_eq!(titles(&batch), ["a", "b", "c", "d"]);
        assert_eq!(batch.files, 2);
        assert_eq!(batch.rows_read, 6);
    }

    #[test]
    fn carried_rows_are_deduplicated_against_later_chunks() {
        let mut acc = Accumulator::new(3);

        assert!(acc.push(chunk(&["a", "a", "b", "b"])).is_none());
        let batch = acc.push(chunk(&["b", "c"])).unwrap();

        assert_eq!(titles(&batch), ["a", "b", "c"]);
    }

    #[test]
    fn rows_differing_only_in_description_are_both_kept() {
        let mut described = row("a");
        described.description = Some("details".to_string());
        let mut acc = Accumulator::new(10);

        acc.push(vec![row("a"), described.clone(), row("a")]);

        assert_eq!(acc.finish().unwrap().rows, vec![row("a"), described]);
    }

    #[test]
    fn finish_flushes_a_tiny_tail() {
        let mut acc = Accumulator::new(100);

        assert!(acc.push(chunk(&["a"])).is_none());
        let batch = acc.finish().unwrap();

        assert_eq!(titles(&batch), ["a"]);
        assert_eq!(batch.files, 1);
    }

    #[test]
    fn finish_reports_files_that_yielded_no_rows() {
        let mut acc = Accumulator::new(5);
        acc.push(Vec::new());

        let batch = acc.finish().unwrap();

        assert!(batch.is_empty());
        assert_eq!(batch.files, 1);
    }

    #[test]
    fn empty_input_yields_no_batches() {
        assert!(collect(Vec::new(), 4).is_empty());
    }

    #[test]
    fn iterator_flushes_last_chunk_regardless_of_size() {
        let out = collect(vec![chunk(&["a", "b", "c"]), chunk(&["d"])], 2);

        assert_eq!(out.len(), 2);
        assert_eq!(titles(&out[0]), ["a", "b", "c"]);
        assert_eq!(titles(&out[1]), ["d"]);
    }

    #[test]
    fn duplicate_across_flushed_batches_is_left_for_the_store() {
        // Chunk sizes 3, 1, 4 with cutoff 2; "x" appears in the first two chunks.
        let chunks = vec![
            chunk(&["x", "p", "p"]),
            chunk(&["x"]),
            chunk(&["q", "r", "s", "t"]),
        ];

        let out = collect(chunks, 2);

        assert_eq!(out.len(), 2);
        assert_eq!(titles(&out[0]), ["x", "p"]);
        assert_eq!(titles(&out[1]), ["x", "q", "r", "s", "t"]);
    }

    #[test]
    fn duplicate_in_carried_residual_is_removed_on_merge() {
        let chunks = vec![
            chunk(&["x", "p", "p", "p"]),
            chunk(&["x"]),
            chunk(&["q", "r", "s", "t"]),
        ];

        let out = collect(chunks, 3);

        assert_eq!(out.len(), 1);
        assert_eq!(titles(&out[0]), ["x", "p", "q", "r", "s", "t"]);
        assert_eq!(out[0].files, 3);
        assert_eq!(out[0].rows_read, 9);
    }

    #[test]
    fn chunk_error_is_yielded_and_ends_the_sequence() {
        let chunks: Vec<Result<Vec<Headline>, &str>> =
            vec![Ok(chunk(&["a"])), Err("unreadable"), Ok(chunk(&["b", "c", "d"]))];

        let mut out = batches(chunks, 2);

        assert_eq!(out.next(), Some(Err("unreadable")));
        assert_eq!(out.next(), None);
    }

    #[test]
    fn every_batch_but_the_last_meets_the_cutoff() {
        let cutoff = 5;
        let chunks: Vec<Vec<Headline>> = (0..40)
            .map(|i| {
                let titles: Vec<String> = (0..(i % 7)).map(|j| format!("{}", (i + j) % 11)).collect();
                titles.iter().map(|t| row(t)).collect()
            })
            .collect();
        let total_files = chunks.len();

        let out = collect(chunks, cutoff);

        let (last, rest) = out.split_last().unwrap();
        for batch in rest {
            assert!(batch.len() >= cutoff, "undersized batch: {}", batch.len());
        }
        for batch in &out {
            let unique: HashSet<_> = batch.rows.iter().collect();
            assert_eq!(unique.len(), batch.len());
        }
        assert!(last.files > 0);
        assert_eq!(out.iter().map(|b| b.files).sum::<usize>(), total_files);
    }
}
