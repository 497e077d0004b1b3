use chrono::{DateTime, Utc};

use crate::domain::{Article, ArticleIndex, CandidateItem, Feed};
use crate::errors::NewsreelResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedRepository: Send + Sync {
    fn add(&self, feed: &Feed) -> NewsreelResult<i64>;
    fn remove(&self, id: i64) -> NewsreelResult<()>;
    fn get_all(&self) -> NewsreelResult<Vec<Feed>>;
    fn get_active(&self) -> NewsreelResult<Vec<Feed>>;
    fn get_by_id(&self, id: i64) -> NewsreelResult<Option<Feed>>;
    fn get_by_url(&self, url: &str) -> NewsreelResult<Option<Feed>>;
    fn exists(&self, url: &str) -> NewsreelResult<bool>;
    fn set_active(&self, id: i64, active: bool) -> NewsreelResult<()>;
    /// The orchestrator's post-fetch state transition: both fields move
    /// together so a row never ends up half-updated.
    fn update_fetch_state(
        &self,
        id: i64,
        last_fetched: DateTime<Utc>,
        error_count: u32,
    ) -> NewsreelResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ArticleRepository: Send + Sync {
    /// Insert candidates one by one, swallowing uniqueness conflicts.
    /// Returns the articles that actually landed.
    fn insert_batch(
        &self,
        feed_id: i64,
        candidates: &[CandidateItem],
    ) -> NewsreelResult<Vec<Article>>;

    /// Lookup keys (links, guids, titles) of a feed's stored articles.
    fn existing_index(&self, feed_id: i64) -> NewsreelResult<ArticleIndex>;

    fn count_for_feed(&self, feed_id: i64) -> NewsreelResult<usize>;

    /// Delete articles older than `max_age_days` plus, per feed, everything
    /// ranked beyond `max_per_feed` by pub_date descending. An article
    /// matching both conditions is deleted once.
    fn prune(&self, max_age_days: u32, max_per_feed: usize) -> NewsreelResult<usize>;
}
