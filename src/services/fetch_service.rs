use chrono::Utc;
use tracing::{debug, info, warn};

use crate::dedupe::DuplicateDetector;
use crate::domain::{Feed, FetchOutcome, RunSummary};
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::FeedParser;
use crate::storage::traits::{ArticleRepository, FeedRepository};

/// Drives one feed's parse-filter-persist cycle and iterates all active
/// feeds for a full run. Owns the post-fetch state transition of a feed's
/// `error_count`/`last_fetched`; nothing else writes those fields.
pub struct FetchService<F: FeedRepository, A: ArticleRepository, P: FeedParser> {
    feed_repository: F,
    article_repository: A,
    parser: P,
}

impl<F: FeedRepository, A: ArticleRepository, P: FeedParser> FetchService<F, A, P> {
    pub fn new(feed_repository: F, article_repository: A, parser: P) -> Self {
        Self {
            feed_repository,
            article_repository,
            parser,
        }
    }

    /// Fetch a single feed and persist whatever is new.
    ///
    /// A parse failure increments the feed's error count and stamps
    /// `last_fetched`, but never deactivates the feed. A successful fetch
    /// resets the error count to zero, however many errors came before.
    pub fn fetch_one(&self, feed: &Feed) -> NewsreelResult<usize> {
        let feed_id = feed
            .id
            .ok_or_else(|| NewsreelError::FeedNotFound("Feed has no ID".to_string()))?;

        let parsed = match self.parser.parse(&feed.url) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.feed_repository.update_fetch_state(
                    feed_id,
                    Utc::now(),
                    feed.error_count + 1,
                )?;
                warn!(
                    feed = %feed.title,
                    error_count = feed.error_count + 1,
                    "fetch failed"
                );
                return Err(e);
            }
        };

        if parsed.items.is_empty() {
            debug!(feed = %feed.title, "no valid candidates in feed");
            return Ok(0);
        }

        let existing = self.article_repository.existing_index(feed_id)?;
        let fresh = DuplicateDetector::filter(parsed.items, &existing);
        let inserted = self.article_repository.insert_batch(feed_id, &fresh)?;

        self.feed_repository
            .update_fetch_state(feed_id, Utc::now(), 0)?;

        info!(
            feed = %feed.title,
            inserted = inserted.len(),
            "fetch complete"
        );

        Ok(inserted.len())
    }

    /// Fetch every active feed sequentially. One feed's failure never
    /// aborts the loop; only repository-level failures do.
    pub fn fetch_all(&self) -> NewsreelResult<RunSummary> {
        let feeds = self.feed_repository.get_active()?;
        let mut summary = RunSummary::default();

        info!(feeds = feeds.len(), "starting fetch run");

        for feed in feeds {
            let outcome = match self.fetch_one(&feed) {
                Ok(inserted) => FetchOutcome::Fetched { inserted },
                Err(e) => {
                    warn!(feed = %feed.title, error = %e, "feed skipped this run");
                    FetchOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };
            summary.record(&outcome);
        }

        info!(
            fetched = summary.total_fetched,
            errors = summary.total_errors,
            feeds = summary.feeds_processed,
            "fetch run finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CandidateItem;
    use crate::parser::traits::{FeedMeta, MockFeedParser, ParsedFeed};
    use crate::storage::sqlite::{SqliteArticleRepository, SqliteFeedRepository, SqliteStorage};

    fn candidate(title: &str, link: &str, guid: &str) -> CandidateItem {
        CandidateItem::new(title.to_string(), link.to_string(), "content".to_string())
            .with_guid(Some(guid.to_string()))
    }

    fn parsed(items: Vec<CandidateItem>) -> ParsedFeed {
        ParsedFeed {
            meta: FeedMeta::default(),
            items,
        }
    }

    fn setup_with_parser(
        parser: MockFeedParser,
    ) -> (
        FetchService<SqliteFeedRepository, SqliteArticleRepository, MockFeedParser>,
        SqliteFeedRepository,
        SqliteArticleRepository,
    ) {
        let storage = SqliteStorage::in_memory().unwrap();
        let feed_repo = SqliteFeedRepository::new(storage.clone());
        let article_repo = SqliteArticleRepository::new(storage.clone());
        let service = FetchService::new(
            SqliteFeedRepository::new(storage.clone()),
            SqliteArticleRepository::new(storage),
            parser,
        );
        (service, feed_repo, article_repo)
    }

    fn add_feed(repo: &SqliteFeedRepository, url: &str) -> Feed {
        let feed = Feed::new(url.to_string(), url.to_string());
        let id = repo.add(&feed).unwrap();
        repo.get_by_id(id).unwrap().unwrap()
    }

    #[test]
    fn test_fetch_one_inserts_and_resets_error_count() {
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| {
            Ok(parsed(vec![
                candidate("A", "https://e.com/a", "a"),
                candidate("B", "https://e.com/b", "b"),
                candidate("C", "https://e.com/c", "c"),
            ]))
        });

        let (service, feed_repo, _) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");
        let feed_id = feed.id.unwrap();

        // Simulate a feed that has been failing
        feed_repo
            .update_fetch_state(feed_id, Utc::now(), 2)
            .unwrap();
        let feed = feed_repo.get_by_id(feed_id).unwrap().unwrap();
        assert_eq!(feed.error_count, 2);

        let inserted = service.fetch_one(&feed).unwrap();
        assert_eq!(inserted, 3);

        let updated = feed_repo.get_by_id(feed_id).unwrap().unwrap();
        assert_eq!(updated.error_count, 0);
        assert!(updated.last_fetched.is_some());
    }

    #[test]
    fn test_fetch_one_idempotent() {
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| {
            Ok(parsed(vec![
                candidate("A", "https://e.com/a", "a"),
                candidate("B", "https://e.com/b", "b"),
            ]))
        });

        let (service, feed_repo, article_repo) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");

        assert_eq!(service.fetch_one(&feed).unwrap(), 2);
        // Remote content unchanged: second run inserts nothing
        assert_eq!(service.fetch_one(&feed).unwrap(), 0);
        assert_eq!(article_repo.count_for_feed(feed.id.unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_fetch_one_partial_duplicates() {
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| {
            Ok(parsed(vec![
                candidate("A", "https://e.com/a", "a"),
                candidate("B", "https://e.com/b", "b"),
                candidate("C", "https://e.com/c", "c"),
                candidate("D", "https://e.com/d", "d"),
                candidate("E", "https://e.com/e", "e"),
            ]))
        });

        let (service, feed_repo, article_repo) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");

        // Two of the five already stored
        article_repo
            .insert_batch(
                feed.id.unwrap(),
                &[
                    candidate("A", "https://e.com/a", "a"),
                    candidate("B", "https://e.com/b", "b"),
                ],
            )
            .unwrap();

        assert_eq!(service.fetch_one(&feed).unwrap(), 3);
        assert_eq!(article_repo.count_for_feed(feed.id.unwrap()).unwrap(), 5);
    }

    #[test]
    fn test_fetch_one_parse_failure_increments_error_count() {
        let mut parser = MockFeedParser::new();
        parser
            .expect_parse()
            .returning(|_| Err(NewsreelError::FeedParse("boom".to_string())));

        let (service, feed_repo, _) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");

        let result = service.fetch_one(&feed);
        assert!(result.is_err());

        let updated = feed_repo.get_by_id(feed.id.unwrap()).unwrap().unwrap();
        assert_eq!(updated.error_count, 1);
        assert!(updated.last_fetched.is_some());
        // Errors never deactivate a feed
        assert!(updated.is_active);
    }

    #[test]
    fn test_fetch_one_zero_candidates_leaves_state_alone() {
        let mut parser = MockFeedParser::new();
        parser.expect_parse().returning(|_| Ok(parsed(vec![])));

        let (service, feed_repo, _) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");
        feed_repo
            .update_fetch_state(feed.id.unwrap(), Utc::now(), 3)
            .unwrap();
        let feed = feed_repo.get_by_id(feed.id.unwrap()).unwrap().unwrap();

        assert_eq!(service.fetch_one(&feed).unwrap(), 0);

        let after = feed_repo.get_by_id(feed.id.unwrap()).unwrap().unwrap();
        assert_eq!(after.error_count, 3);
    }

    #[test]
    fn test_fetch_all_isolates_failures() {
        let mut parser = MockFeedParser::new();
        parser
            .expect_parse()
            .withf(|url| url.contains("broken"))
            .returning(|_| Err(NewsreelError::FeedParse("server hates us".to_string())));
        parser
            .expect_parse()
            .withf(|url| url.contains("healthy"))
            .returning(|_| Ok(parsed(vec![candidate("A", "https://healthy.com/a", "a")])));

        let (service, feed_repo, _) = setup_with_parser(parser);
        let broken = add_feed(&feed_repo, "https://broken.com/feed");
        let healthy = add_feed(&feed_repo, "https://healthy.com/feed");
        feed_repo
            .update_fetch_state(healthy.id.unwrap(), Utc::now(), 5)
            .unwrap();

        let summary = service.fetch_all().unwrap();

        assert_eq!(summary.feeds_processed, 2);
        assert_eq!(summary.total_fetched, 1);
        assert_eq!(summary.total_errors, 1);

        let broken_after = feed_repo.get_by_id(broken.id.unwrap()).unwrap().unwrap();
        assert_eq!(broken_after.error_count, 1);

        let healthy_after = feed_repo.get_by_id(healthy.id.unwrap()).unwrap().unwrap();
        assert_eq!(healthy_after.error_count, 0);
    }

    #[test]
    fn test_fetch_all_skips_inactive_feeds() {
        let mut parser = MockFeedParser::new();
        parser
            .expect_parse()
            .returning(|_| Ok(parsed(vec![candidate("A", "https://e.com/a", "a")])));

        let (service, feed_repo, _) = setup_with_parser(parser);
        let feed = add_feed(&feed_repo, "https://e.com/feed");
        feed_repo.set_active(feed.id.unwrap(), false).unwrap();

        let summary = service.fetch_all().unwrap();
        assert_eq!(summary.feeds_processed, 0);
    }

    #[test]
    fn test_fetch_all_empty() {
        let parser = MockFeedParser::new();
        let (service, _, _) = setup_with_parser(parser);

        let summary = service.fetch_all().unwrap();
        assert_eq!(summary.feeds_processed, 0);
        assert_eq!(summary.total_fetched, 0);
        assert_eq!(summary.total_errors, 0);
    }
}
