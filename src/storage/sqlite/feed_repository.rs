use chrono::{DateTime, Utc};
use rusqlite::Row;

use crate::domain::Feed;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::FeedRepository;

const FEED_COLUMNS: &str = "id, url, title, description, link, language, is_active, \
                            last_fetched, error_count, fetch_interval_secs, created_at";

pub struct SqliteFeedRepository {
    storage: SqliteStorage,
}

impl SqliteFeedRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn map_row(row: &Row) -> rusqlite::Result<Feed> {
        let last_fetched: Option<String> = row.get(7)?;

        Ok(Feed {
            id: Some(row.get(0)?),
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            link: row.get(4)?,
            language: row.get(5)?,
            is_active: row.get(6)?,
            last_fetched: last_fetched.and_then(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
            error_count: row.get(8)?,
            fetch_interval_secs: row.get::<_, i64>(9)? as u64,
            created_at: row.get(10)?,
        })
    }
}

impl FeedRepository for SqliteFeedRepository {
    fn add(&self, feed: &Feed) -> NewsreelResult<i64> {
        let conn = self.storage.connection()?;

        // Check within the same connection to avoid deadlock
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([&feed.url], |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(NewsreelError::FeedAlreadyExists(feed.url.clone()));
        }

        conn.execute(
            "INSERT INTO feeds (url, title, description, link, language, is_active, fetch_interval_secs) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                &feed.url,
                &feed.title,
                &feed.description,
                &feed.link,
                &feed.language,
                feed.is_active,
                feed.fetch_interval_secs as i64,
            ),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn remove(&self, id: i64) -> NewsreelResult<()> {
        let conn = self.storage.connection()?;
        conn.execute("DELETE FROM feeds WHERE id = ?1", [id])?;
        Ok(())
    }

    fn get_all(&self) -> NewsreelResult<Vec<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feeds ORDER BY created_at DESC",
            FEED_COLUMNS
        ))?;

        let feeds = stmt.query_map([], Self::map_row)?;
        feeds
            .collect::<Result<Vec<_>, _>>()
            .map_err(NewsreelError::from)
    }

    fn get_active(&self) -> NewsreelResult<Vec<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM feeds WHERE is_active = 1 ORDER BY id",
            FEED_COLUMNS
        ))?;

        let feeds = stmt.query_map([], Self::map_row)?;
        feeds
            .collect::<Result<Vec<_>, _>>()
            .map_err(NewsreelError::from)
    }

    fn get_by_id(&self, id: i64) -> NewsreelResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM feeds WHERE id = ?1", FEED_COLUMNS))?;

        match stmt.query_row([id], Self::map_row) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(NewsreelError::from(e)),
        }
    }

    fn get_by_url(&self, url: &str) -> NewsreelResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM feeds WHERE url = ?1", FEED_COLUMNS))?;

        match stmt.query_row([url], Self::map_row) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(NewsreelError::from(e)),
        }
    }

    fn exists(&self, url: &str) -> NewsreelResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([url], |row| row.get(0))?;
        Ok(exists)
    }

    fn set_active(&self, id: i64, active: bool) -> NewsreelResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "UPDATE feeds SET is_active = ?2 WHERE id = ?1",
            (id, active),
        )?;
        Ok(())
    }

    fn update_fetch_state(
        &self,
        id: i64,
        last_fetched: DateTime<Utc>,
        error_count: u32,
    ) -> NewsreelResult<()> {
        let conn = self.storage.connection()?;
        conn.execute(
            "UPDATE feeds SET last_fetched = ?2, error_count = ?3 WHERE id = ?1",
            (id, last_fetched.to_rfc3339(), error_count),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteFeedRepository {
        let storage = SqliteStorage::in_memory().unwrap();
        SqliteFeedRepository::new(storage)
    }

    fn sample_feed(url: &str) -> Feed {
        Feed::new(url.to_string(), "Example Feed".to_string())
            .with_description(Some("A test feed".to_string()))
            .with_link(Some("https://example.com".to_string()))
    }

    #[test]
    fn test_add_and_get_feed() {
        let repo = setup_repo();
        let id = repo.add(&sample_feed("https://example.com/feed")).unwrap();
        assert!(id > 0);

        let retrieved = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Example Feed");
        assert_eq!(retrieved.url, "https://example.com/feed");
        assert!(retrieved.is_active);
        assert_eq!(retrieved.error_count, 0);
        assert!(retrieved.last_fetched.is_none());
    }

    #[test]
    fn test_duplicate_url_rejected() {
        let repo = setup_repo();
        let feed = sample_feed("https://example.com/feed");

        repo.add(&feed).unwrap();
        let result = repo.add(&feed);

        assert!(matches!(result, Err(NewsreelError::FeedAlreadyExists(_))));
    }

    #[test]
    fn test_remove_feed() {
        let repo = setup_repo();
        let id = repo.add(&sample_feed("https://example.com/feed")).unwrap();
        repo.remove(id).unwrap();

        assert!(repo.get_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_get_active_excludes_disabled() {
        let repo = setup_repo();
        let a = repo.add(&sample_feed("https://a.com/feed")).unwrap();
        let b = repo.add(&sample_feed("https://b.com/feed")).unwrap();

        repo.set_active(a, false).unwrap();

        let active = repo.get_active().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, Some(b));
    }

    #[test]
    fn test_update_fetch_state_round_trips() {
        let repo = setup_repo();
        let id = repo.add(&sample_feed("https://example.com/feed")).unwrap();

        let now = Utc::now();
        repo.update_fetch_state(id, now, 4).unwrap();

        let feed = repo.get_by_id(id).unwrap().unwrap();
        assert_eq!(feed.error_count, 4);
        let fetched = feed.last_fetched.unwrap();
        assert!((fetched - now).num_seconds().abs() < 2);
    }

    #[test]
    fn test_exists() {
        let repo = setup_repo();
        assert!(!repo.exists("https://example.com/feed").unwrap());
        repo.add(&sample_feed("https://example.com/feed")).unwrap();
        assert!(repo.exists("https://example.com/feed").unwrap());
    }
}
