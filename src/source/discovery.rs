use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

use super::registry::SourceRegistry;

/// A CSV archive paired with the feed it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub feed_url: String,
}

/// Walk `root` for `<SourceName>.csv` files and pair each with its registered feed.
///
/// Files whose stem matches no registered source are skipped. A stem registered more
/// than once aborts discovery before anything is inserted.
pub fn discover(root: &Path, registry: &SourceRegistry) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".csv") else {
            continue;
        };

        match registry.lookup(stem, entry.path())? {
            Some(feed) => files.push(SourceFile {
                path: entry.into_path(),
                feed_url: feed.url.clone(),
            }),
            None => {
                tracing::debug!("No registered source for {}", entry.path().display());
                skipped += 1;
            }
        }
    }

    tracing::info!(
        "Discovered {} source files under {} ({} unmatched)",
        files.len(),
        root.display(),
        skipped
    );
    Ok(files)
}
