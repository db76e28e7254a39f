use async_trait::async_trait;
use rusqlite::{ffi, ErrorCode};
use thiserror::Error;

use crate::error::AppError;
use crate::models::Headline;

/// Outcome of a failed bulk insert, split by whether the batch inserter can recover.
#[derive(Debug, Error)]
pub enum StoreError {
    /// At least one row collided with an existing `(url, date, title)` key.
    #[error("uniqueness constraint violated")]
    UniquenessViolation,

    #[error(transparent)]
    Other(#[from] AppError),
}

impl From<tokio_rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(ref e) if is_uniqueness_violation(e) => {
                StoreError::UniquenessViolation
            }
            other => StoreError::Other(other.into()),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if is_uniqueness_violation(&err) {
            StoreError::UniquenessViolation
        } else {
            StoreError::Other(err.into())
        }
    }
}

fn is_uniqueness_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == ErrorCode::ConstraintViolation
                && (e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

/// Destination for headline batches.
///
/// `bulk_insert` must be atomic: when it returns an error, none of `rows` may have been
/// committed.
#[async_trait]
pub trait HeadlineStore: Send + Sync {
    async fn bulk_insert(&self, rows: &[Headline]) -> Result<(), StoreError>;
}

/// In-memory store that enforces the natural key and records every attempt size.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    state: std::sync::Mutex<MemoryState>,
}

#[cfg(test)]
#[derive(Default)]
struct MemoryState {
    keys: std::collections::HashSet<(String, String, String)>,
    rows: Vec<Headline>,
    attempts: Vec<usize>,
    broken: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_rows(rows: &[Headline]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for row in rows {
                state.keys.insert(natural_key(row));
                state.rows.push(row.clone());
            }
        }
        store
    }

    /// Every subsequent insert fails with a non-uniqueness error.
    pub fn broken() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().broken = true;
        store
    }

    pub fn rows(&self) -> Vec<Headline> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn attempts(&self) -> Vec<usize> {
        self.state.lock().unwrap().attempts.clone()
    }
}

#[cfg(test)]
fn natural_key(row: &Headline) -> (String, String, String) {
    (row.url.clone(), row.date.clone(), row.title.clone())
}

#[cfg(test)]
#[async_trait]
impl HeadlineStore for MemoryStore {
    async fn bulk_insert(&self, rows: &[Headline]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.attempts.push(rows.len());
        if state.broken {
            return Err(AppError::Other(anyhow::anyhow!("disk I/O error")).into());
        }

        let mut seen = std::collections::HashSet::new();
        for row in rows {
            let key = natural_key(row);
            if state.keys.contains(&key) || !seen.insert(key) {
                return Err(StoreError::UniquenessViolation);
            }
        }
        state.keys.extend(seen);
        state.rows.extend_from_slice(rows);
        Ok(())
    }
}
