use std::path::Path;

use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Feed, Headline};

use super::schema::{INSERT_FEED, INSERT_HEADLINE, PRAGMAS, SCHEMA};
use super::store::{HeadlineStore, StoreError};

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Feed operations

    /// Store every feed in one transaction, leaving already registered urls untouched.
    /// Returns how many feeds were new.
    pub async fn register_feeds(&self, feeds: Vec<Feed>) -> Result<usize> {
        let added = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut added = 0;
                {
                    let mut stmt = tx.prepare_cached(INSERT_FEED)?;
                    for feed in &feeds {
                        added += stmt.execute(params![feed.url, feed.name])?;
                    }
                }
                tx.commit()?;
                Ok(added)
            })
            .await?;
        Ok(added)
    }

    // Headline operations

    pub async fn count_headlines(&self) -> Result<i64> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM headline", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }

    #[cfg(test)]
    pub async fn all_headlines(&self) -> Result<Vec<Headline>> {
        let headlines = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT url, date, title, description FROM headline ORDER BY url, date, title",
                )?;
                let headlines = stmt
                    .query_map([], |row| {
                        Ok(Headline {
                            url: row.get(0)?,
                            date: row.get(1)?,
                            title: row.get(2)?,
                            description: row.get(3)?,
                        })
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(headlines)
            })
            .await?;
        Ok(headlines)
    }
}

#[async_trait]
impl HeadlineStore for Repository {
    async fn bulk_insert(&self, rows: &[Headline]) -> std::result::Result<(), StoreError> {
        let rows = rows.to_vec();
        self.conn
            .call(move |conn| {
                // Dropping an uncommitted transaction rolls it back.
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare_cached(INSERT_HEADLINE)?;
                    for row in &rows {
                        stmt.execute(params![row.url, row.date, row.title, row.description])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(url: &str) -> Feed {
        Feed {
            url: url.to_string(),
            name: format!("name of {url}"),
        }
    }

    fn headline(url: &str, title: &str) -> Headline {
        Headline {
            url: url.to_string(),
            date: "2020-01-01 00:00:00".to_string(),
            title: title.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn register_feeds_is_idempotent() {
        let repo = Repository::open_in_memory().await.unwrap();

        assert_eq!(repo.register_feeds(vec![feed("a"), feed("b")]).await.unwrap(), 2);
        assert_eq!(repo.register_feeds(vec![feed("b"), feed("c")]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_bulk_insert_commits_nothing() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.register_feeds(vec![feed("a")]).await.unwrap();
        repo.bulk_insert(&[headline("a", "old")]).await.unwrap();

        let result = repo
            .bulk_insert(&[headline("a", "new"), headline("a", "old")])
            .await;

        assert!(matches!(result, Err(StoreError::UniquenessViolation)));
        assert_eq!(repo.all_headlines().await.unwrap(), vec![headline("a", "old")]);
    }

    #[tokio::test]
    async fn unknown_feed_is_not_a_uniqueness_violation() {
        let repo = Repository::open_in_memory().await.unwrap();

        let result = repo.bulk_insert(&[headline("nowhere", "t")]).await;

        assert!(matches!(result, Err(StoreError::Other(_))));
        assert_eq!(repo.count_headlines().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn database_file_is_reopened_with_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.db");

        {
            let repo = Repository::new(&path).await.unwrap();
            repo.register_feeds(vec![feed("a")]).await.unwrap();
            repo.bulk_insert(&[headline("a", "t")]).await.unwrap();
        }

        let repo = Repository::new(&path).await.unwrap();
        assert_eq!(repo.count_headlines().await.unwrap(), 1);
    }
}
