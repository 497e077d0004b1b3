use tracing::info;

use crate::errors::NewsreelResult;
use crate::storage::traits::ArticleRepository;

/// Deletes articles past the retention window and trims each feed to the
/// configured cap.
pub struct RetentionService<A: ArticleRepository> {
    article_repository: A,
    max_articles_per_feed: usize,
}

impl<A: ArticleRepository> RetentionService<A> {
    pub fn new(article_repository: A, max_articles_per_feed: usize) -> Self {
        Self {
            article_repository,
            max_articles_per_feed,
        }
    }

    pub fn cleanup(&self, days_to_keep: u32) -> NewsreelResult<usize> {
        let deleted = self
            .article_repository
            .prune(days_to_keep, self.max_articles_per_feed)?;

        info!(deleted, days_to_keep, "retention cleanup finished");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use crate::domain::{CandidateItem, Feed};
    use crate::storage::sqlite::{SqliteArticleRepository, SqliteFeedRepository, SqliteStorage};
    use crate::storage::traits::FeedRepository;

    #[test]
    fn test_cleanup_delegates_with_cap() {
        let storage = SqliteStorage::in_memory().unwrap();
        let feed_repo = SqliteFeedRepository::new(storage.clone());
        let article_repo = SqliteArticleRepository::new(storage.clone());

        let feed_id = feed_repo
            .add(&Feed::new(
                "https://example.com/feed".to_string(),
                "Example".to_string(),
            ))
            .unwrap();

        let stale = CandidateItem::new(
            "Stale".to_string(),
            "https://e.com/stale".to_string(),
            "content".to_string(),
        )
        .with_pub_date(Utc::now() - Duration::days(45));
        let fresh = CandidateItem::new(
            "Fresh".to_string(),
            "https://e.com/fresh".to_string(),
            "content".to_string(),
        );
        article_repo.insert_batch(feed_id, &[stale, fresh]).unwrap();

        let service = RetentionService::new(SqliteArticleRepository::new(storage), 100);
        assert_eq!(service.cleanup(30).unwrap(), 1);
        assert_eq!(article_repo.count_for_feed(feed_id).unwrap(), 1);
    }
}
