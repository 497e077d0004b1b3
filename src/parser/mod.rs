pub mod traits;
pub mod primary;
pub mod fallback;
pub mod transient;
pub mod http;

pub use traits::{FeedMeta, FeedParser, FeedValidation, ParsedFeed};
pub use http::{HttpFeedParser, PLACEHOLDER_METADATA};

#[cfg(test)]
pub use traits::MockFeedParser;
