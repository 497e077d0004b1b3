pub mod feed;
pub mod article;
pub mod run;

pub use feed::{Feed, DEFAULT_FETCH_INTERVAL_SECS};
pub use article::{Article, ArticleIndex, CandidateItem};
pub use run::{FetchOutcome, RunSummary};
