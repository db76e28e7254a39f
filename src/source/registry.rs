use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Feed;

#[derive(Debug, Deserialize)]
struct SourceRecord {
    #[serde(rename = "NAME")]
    name: String,
    #[serde(rename = "RSS_URL")]
    url: String,
}

/// Registered sources, looked up by the file stem their CSV archives are named after.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    feeds: Vec<Feed>,
    by_name: HashMap<String, Vec<usize>>,
}

impl SourceRegistry {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut registry = Self::default();
        for record in reader.deserialize() {
            let record: SourceRecord = record?;
            registry
                .by_name
                .entry(record.name.clone())
                .or_default()
                .push(registry.feeds.len());
            registry.feeds.push(Feed {
                url: record.url,
                name: record.name,
            });
        }
        Ok(registry)
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Feed registered under `name`, `None` if there is none, an error if several are.
    pub fn lookup(&self, name: &str, file: &Path) -> Result<Option<&Feed>> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([index]) => Ok(Some(&self.feeds[*index])),
            Some(indices) => Err(AppError::MultipleSources {
                file: file.to_path_buf(),
                urls: indices.iter().map(|&i| self.feeds[i].url.clone()).collect(),
            }),
        }
    }
}
