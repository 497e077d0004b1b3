use serde::{Deserialize, Serialize};

/// Result of fetching a single feed. Not persisted.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Fetched { inserted: usize },
    Failed { message: String },
}

/// Aggregate of one `fetch_all` run across every active feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_fetched: usize,
    pub total_errors: usize,
    pub feeds_processed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &FetchOutcome) {
        self.feeds_processed += 1;
        match outcome {
            FetchOutcome::Fetched { inserted } => self.total_fetched += inserted,
            FetchOutcome::Failed { .. } => self.total_errors += 1,
        }
    }
}
