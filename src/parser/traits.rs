use crate::domain::CandidateItem;
use crate::errors::NewsreelResult;

/// Feed-level metadata extracted alongside the items.
#[derive(Debug, Clone, Default)]
pub struct FeedMeta {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
}

/// A fully parsed feed: metadata plus normalized candidate items.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub meta: FeedMeta,
    pub items: Vec<CandidateItem>,
}

impl ParsedFeed {
    /// Drop items without a link or content. Returns how many were removed.
    pub fn retain_valid(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.is_valid());
        before - self.items.len()
    }
}

/// Outcome of validating a feed URL at registration time.
///
/// A feed can be accepted with a warning when both parse strategies failed
/// for reasons that look temporary (anti-bot responses, DNS hiccups); the
/// metadata is then a placeholder until the first successful fetch.
#[derive(Debug, Clone)]
pub struct FeedValidation {
    pub meta: FeedMeta,
    pub warning: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedParser: Send + Sync {
    /// Fetch and parse a feed URL into metadata and candidate items.
    fn parse(&self, url: &str) -> NewsreelResult<ParsedFeed>;

    /// Validate a feed URL for registration.
    fn validate(&self, url: &str) -> NewsreelResult<FeedValidation>;
}
