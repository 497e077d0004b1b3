use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default refresh interval for a feed, in seconds.
pub const DEFAULT_FETCH_INTERVAL_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
    pub is_active: bool,
    pub last_fetched: Option<DateTime<Utc>>,
    pub error_count: u32,
    pub fetch_interval_secs: u64,
    pub created_at: Option<String>,
}

impl Feed {
    pub fn new(url: String, title: String) -> Self {
        Self {
            id: None,
            url,
            title,
            description: None,
            link: None,
            language: None,
            is_active: true,
            last_fetched: None,
            error_count: 0,
            fetch_interval_secs: DEFAULT_FETCH_INTERVAL_SECS,
            created_at: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}
