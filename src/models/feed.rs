use serde::{Deserialize, Serialize};

/// A registered news source. `url` is the primary key headlines refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub url: String,
    pub name: String,
}
