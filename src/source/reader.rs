use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Headline;

use super::discovery::SourceFile;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct RawHeadline {
    #[serde(rename = "DATE")]
    date: Option<String>,
    #[serde(rename = "TITLE")]
    title: Option<String>,
    #[serde(rename = "SUMMARY", default)]
    summary: Option<String>,
}

pub fn load_headlines(source: &SourceFile) -> Result<Vec<Headline>> {
    let file = std::fs::File::open(&source.path)?;
    read_headlines(file, &source.feed_url, &source.path)
}

/// Parse one source archive into headlines attributed to `feed_url`.
pub fn read_headlines<R: io::Read>(
    reader: R,
    feed_url: &str,
    path: &Path,
) -> Result<Vec<Headline>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?;
    for column in ["DATE", "TITLE"] {
        if !headers.iter().any(|h| h == column) {
            return Err(AppError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut headlines = Vec::new();
    let mut undated = 0usize;
    let mut untitled = 0usize;
    for record in reader.deserialize() {
        let raw: RawHeadline = record?;
        let Some(date) = non_empty(raw.date) else {
            undated += 1;
            continue;
        };
        let summary = non_empty(raw.summary);
        let (title, description) = match non_empty(raw.title) {
            Some(title) => (title, summary),
            None => match summary {
                Some(summary) => (summary, None),
                None => {
                    untitled += 1;
                    continue;
                }
            },
        };

        headlines.push(Headline {
            url: feed_url.to_string(),
            date: normalize_date(&date),
            title,
            description,
        });
    }

    if undated > 0 || untitled > 0 {
        tracing::warn!(
            "Skipped {} rows without a date and {} without title or summary in {}",
            undated,
            untitled,
            path.display()
        );
    }
    Ok(headlines)
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.trim().is_empty())
}

/// Rewrite recognised timestamps to `YYYY-MM-DD HH:MM:SS` in UTC; keep anything else.
fn normalize_date(raw: &str) -> String {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc).format(DATE_FORMAT).to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.with_timezone(&Utc).format(DATE_FORMAT).to_string();
    }
    for format in [DATE_FORMAT, "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return naive.format(DATE_FORMAT).to_string();
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return midnight.format(DATE_FORMAT).to_string();
        }
    }
    raw.to_string()
}
