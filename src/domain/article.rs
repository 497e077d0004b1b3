use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub feed_id: i64,
    pub title: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub raw_content: String,
    pub author: Option<String>,
    pub guid: Option<String>,
    pub categories: Vec<String>,
    pub created_at: Option<String>,
}

/// A parsed feed entry that has not yet been deduplicated or persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
    pub pub_date: DateTime<Utc>,
    pub raw_content: String,
    pub author: Option<String>,
    pub guid: Option<String>,
    pub categories: Vec<String>,
}

impl CandidateItem {
    pub fn new(title: String, link: String, raw_content: String) -> Self {
        Self {
            title,
            link,
            raw_content,
            pub_date: Utc::now(),
            author: None,
            guid: None,
            categories: Vec::new(),
        }
    }

    pub fn with_pub_date(mut self, pub_date: DateTime<Utc>) -> Self {
        self.pub_date = pub_date;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn with_guid(mut self, guid: Option<String>) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// A candidate is only worth persisting if it carries both a link and
    /// some content.
    pub fn is_valid(&self) -> bool {
        !self.link.trim().is_empty() && !self.raw_content.trim().is_empty()
    }
}

/// The subset of a feed's stored articles the duplicate detector needs:
/// lookup keys only, never full rows.
#[derive(Debug, Clone, Default)]
pub struct ArticleIndex {
    pub links: Vec<String>,
    pub guids: Vec<String>,
    pub titles: Vec<String>,
}
