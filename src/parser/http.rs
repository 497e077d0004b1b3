use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::fallback;
use crate::parser::primary;
use crate::parser::traits::{FeedMeta, FeedParser, FeedValidation, ParsedFeed};
use crate::parser::transient::is_transient_failure;

/// Placeholder used when a feed is registered while its server refuses us.
pub const PLACEHOLDER_METADATA: &str = "Unable to fetch yet";

/// HTTP-backed implementation of [`FeedParser`]: strict primary strategy
/// with a lenient, identity-rotating fallback.
pub struct HttpFeedParser {
    client: Client,
    attempt_delay: Duration,
}

impl HttpFeedParser {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            attempt_delay: fallback::ATTEMPT_DELAY,
        }
    }

    /// Removes the inter-attempt sleep. Test hook.
    #[cfg(test)]
    pub fn without_attempt_delay(mut self) -> Self {
        self.attempt_delay = Duration::ZERO;
        self
    }
}

impl Default for HttpFeedParser {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl FeedParser for HttpFeedParser {
    fn parse(&self, url: &str) -> NewsreelResult<ParsedFeed> {
        fallback::parseable_url(url)?;

        let mut parsed = match primary::parse(&self.client, url) {
            Ok(parsed) => parsed,
            Err(primary_err) => {
                debug!(url, error = %primary_err, "primary parse failed, trying fallback");
                match fallback::parse(&self.client, url, self.attempt_delay) {
                    Ok(parsed) => parsed,
                    Err(fallback_err) => {
                        return Err(NewsreelError::FeedParse(format!(
                            "primary: {}; fallback: {}",
                            primary_err, fallback_err
                        )));
                    }
                }
            }
        };

        // Items without a link or content are unusable downstream; drop them
        // here so dedupe and persistence never see them.
        let dropped = parsed.retain_valid();
        if dropped > 0 {
            debug!(url, dropped, "discarded candidates missing link or content");
        }

        Ok(parsed)
    }

    fn validate(&self, url: &str) -> NewsreelResult<FeedValidation> {
        match self.parse(url) {
            Ok(parsed) => Ok(FeedValidation {
                meta: parsed.meta,
                warning: None,
            }),
            Err(e) => {
                let message = e.to_string();
                if is_transient_failure(&message) {
                    warn!(url, error = %message, "accepting feed despite transient failure");
                    Ok(FeedValidation {
                        meta: FeedMeta {
                            title: PLACEHOLDER_METADATA.to_string(),
                            description: Some(PLACEHOLDER_METADATA.to_string()),
                            link: None,
                            language: None,
                        },
                        warning: Some(message),
                    })
                } else {
                    Err(NewsreelError::FeedValidation(message))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected_before_any_request() {
        let parser = HttpFeedParser::default().without_attempt_delay();
        let result = parser.parse("not a url");
        assert!(matches!(result, Err(NewsreelError::InvalidUrl(_))));
    }
}
