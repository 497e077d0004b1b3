use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::domain::{Article, ArticleIndex, CandidateItem};
use crate::errors::{NewsreelError, NewsreelResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleRepository;

/// Delete statements are chunked to stay under SQLite's bound-parameter cap.
const DELETE_CHUNK: usize = 500;

pub struct SqliteArticleRepository {
    storage: SqliteStorage,
}

impl SqliteArticleRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn insert_batch(
        &self,
        feed_id: i64,
        candidates: &[CandidateItem],
    ) -> NewsreelResult<Vec<Article>> {
        let conn = self.storage.connection()?;
        let mut inserted = Vec::new();

        for candidate in candidates {
            let categories =
                serde_json::to_string(&candidate.categories).unwrap_or_else(|_| "[]".to_string());

            let result = conn.execute(
                "INSERT INTO articles (feed_id, title, link, pub_date, raw_content, author, guid, categories) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    feed_id,
                    &candidate.title,
                    &candidate.link,
                    candidate.pub_date.to_rfc3339(),
                    &candidate.raw_content,
                    &candidate.author,
                    &candidate.guid,
                    &categories,
                ),
            );

            match result {
                Ok(_) => {
                    inserted.push(Article {
                        id: Some(conn.last_insert_rowid()),
                        feed_id,
                        title: candidate.title.clone(),
                        link: candidate.link.clone(),
                        pub_date: candidate.pub_date,
                        raw_content: candidate.raw_content.clone(),
                        author: candidate.author.clone(),
                        guid: candidate.guid.clone(),
                        categories: candidate.categories.clone(),
                        created_at: None,
                    });
                }
                // A concurrent fetch of the same feed, or state the in-memory
                // filter could not see. The store-level constraint is the
                // real uniqueness guarantee; the row simply stays as it was.
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    warn!(feed_id, link = %candidate.link, "insert skipped: uniqueness conflict");
                }
                Err(e) => return Err(NewsreelError::from(e)),
            }
        }

        Ok(inserted)
    }

    fn existing_index(&self, feed_id: i64) -> NewsreelResult<ArticleIndex> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT link, guid, title FROM articles WHERE feed_id = ?1")?;

        let mut index = ArticleIndex::default();
        let rows = stmt.query_map([feed_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (link, guid, title) = row?;
            index.links.push(link);
            if let Some(guid) = guid {
                index.guids.push(guid);
            }
            index.titles.push(title);
        }

        Ok(index)
    }

    fn count_for_feed(&self, feed_id: i64) -> NewsreelResult<usize> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT count(*) FROM articles WHERE feed_id = ?1")?;
        let count: i64 = stmt.query_row([feed_id], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn prune(&self, max_age_days: u32, max_per_feed: usize) -> NewsreelResult<usize> {
        let cutoff: DateTime<Utc> = Utc::now() - Duration::days(i64::from(max_age_days));

        let conn = self.storage.connection()?;
        let mut doomed: HashSet<i64> = HashSet::new();

        let mut stmt = conn.prepare("SELECT id FROM articles WHERE pub_date < ?1")?;
        for id in stmt.query_map([cutoff.to_rfc3339()], |row| row.get::<_, i64>(0))? {
            doomed.insert(id?);
        }
        drop(stmt);

        let mut stmt = conn.prepare(
            "SELECT id FROM ( \
                 SELECT id, ROW_NUMBER() OVER ( \
                     PARTITION BY feed_id ORDER BY pub_date DESC, id DESC \
                 ) AS rank FROM articles \
             ) WHERE rank > ?1",
        )?;
        for id in stmt.query_map([max_per_feed as i64], |row| row.get::<_, i64>(0))? {
            doomed.insert(id?);
        }
        drop(stmt);

        if doomed.is_empty() {
            return Ok(0);
        }

        let ids: Vec<i64> = doomed.into_iter().collect();
        let mut deleted = 0usize;

        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders: Vec<String> =
                (0..chunk.len()).map(|i| format!("?{}", i + 1)).collect();
            let query = format!(
                "DELETE FROM articles WHERE id IN ({})",
                placeholders.join(", ")
            );
            deleted += conn.execute(&query, rusqlite::params_from_iter(chunk.iter()))?;
        }

        Ok(deleted)
    }
}
