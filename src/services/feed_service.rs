use tracing::info;

use crate::domain::Feed;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::FeedParser;
use crate::storage::traits::FeedRepository;

pub struct FeedService<R: FeedRepository, P: FeedParser> {
    repository: R,
    parser: P,
}

impl<R: FeedRepository, P: FeedParser> FeedService<R, P> {
    pub fn new(repository: R, parser: P) -> Self {
        Self { repository, parser }
    }

    /// Register a new feed by URL.
    ///
    /// Validation runs both parse strategies; a transient-looking failure
    /// still registers the feed with placeholder metadata, and the warning
    /// is returned so the caller can surface it.
    pub fn add(&self, url: &str) -> NewsreelResult<(Feed, Option<String>)> {
        if self.repository.exists(url)? {
            return Err(NewsreelError::FeedAlreadyExists(url.to_string()));
        }

        let validation = self.parser.validate(url)?;

        let feed = Feed::new(url.to_string(), validation.meta.title.clone())
            .with_description(validation.meta.description.clone())
            .with_link(validation.meta.link.clone())
            .with_language(validation.meta.language.clone());

        let id = self.repository.add(&feed)?;
        info!(url, id, "feed registered");

        Ok((
            Feed {
                id: Some(id),
                ..feed
            },
            validation.warning,
        ))
    }

    /// Remove a feed by ID; its articles go with it.
    pub fn remove(&self, id: i64) -> NewsreelResult<()> {
        self.repository.remove(id)
    }

    /// List all feeds
    pub fn list(&self) -> NewsreelResult<Vec<Feed>> {
        self.repository.get_all()
    }

    /// Get a feed by ID
    pub fn get(&self, id: i64) -> NewsreelResult<Option<Feed>> {
        self.repository.get_by_id(id)
    }

    /// Check if a feed URL already exists
    pub fn exists(&self, url: &str) -> NewsreelResult<bool> {
        self.repository.exists(url)
    }
}
