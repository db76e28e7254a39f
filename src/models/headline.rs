use serde::{Deserialize, Serialize};

/// One row of the `headline` table.
///
/// Equality and hashing cover every field, which is what batch deduplication uses.
/// The store enforces uniqueness on the narrower `(url, date, title)` natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Headline {
    pub url: String,
    pub date: String,
    pub title: String,
    pub description: Option<String>,
}

