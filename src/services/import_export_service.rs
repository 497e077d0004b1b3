use opml::{Outline, OPML};

use crate::domain::Feed;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::FeedParser;
use crate::storage::traits::FeedRepository;

pub struct ImportResult {
    pub added: Vec<Feed>,
    pub invalid: Vec<(String, String)>, // (url, error_message)
    pub duplicates: Vec<String>,
}

pub struct ImportExportService<R: FeedRepository, P: FeedParser> {
    repository: R,
    parser: P,
}

impl<R: FeedRepository, P: FeedParser> ImportExportService<R, P> {
    pub fn new(repository: R, parser: P) -> Self {
        Self { repository, parser }
    }

    /// Import feeds from OPML content. Each URL gets the same validation as
    /// a manual add, including the transient-failure allowance.
    pub fn import_opml(&self, content: &str) -> NewsreelResult<ImportResult> {
        let opml =
            OPML::from_str(content).map_err(|e| NewsreelError::OpmlParse(e.to_string()))?;

        let mut result = ImportResult {
            added: Vec::new(),
            invalid: Vec::new(),
            duplicates: Vec::new(),
        };

        let urls = Self::extract_feed_urls(&opml.body.outlines);

        for url in urls {
            if self.repository.exists(&url)? {
                result.duplicates.push(url);
                continue;
            }

            match self.parser.validate(&url) {
                Ok(validation) => {
                    let feed = Feed::new(url.clone(), validation.meta.title)
                        .with_description(validation.meta.description)
                        .with_link(validation.meta.link)
                        .with_language(validation.meta.language);

                    match self.repository.add(&feed) {
                        Ok(id) => {
                            result.added.push(Feed {
                                id: Some(id),
                                ..feed
                            });
                        }
                        Err(e) => {
                            result.invalid.push((url, e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    result.invalid.push((url, e.to_string()));
                }
            }
        }

        Ok(result)
    }

    /// Recursively extract feed URLs from OPML outlines
    fn extract_feed_urls(outlines: &[Outline]) -> Vec<String> {
        let mut urls = Vec::new();

        for outline in outlines {
            if let Some(url) = &outline.xml_url {
                if !url.is_empty() {
                    urls.push(url.clone());
                }
            }

            urls.extend(Self::extract_feed_urls(&outline.outlines));
        }

        urls
    }

    /// Export feeds to OPML format
    pub fn export_opml(&self) -> NewsreelResult<String> {
        let feeds = self.repository.get_all()?;

        let mut opml = OPML::default();
        opml.head = Some(opml::Head {
            title: Some("Newsreel Subscriptions".to_string()),
            ..Default::default()
        });

        for feed in feeds {
            let outline = Outline {
                text: feed.title.clone(),
                r#type: Some("rss".to_string()),
                xml_url: Some(feed.url.clone()),
                html_url: feed.link.clone(),
                title: Some(feed.title),
                ..Default::default()
            };
            opml.body.outlines.push(outline);
        }

        opml.to_string()
            .map_err(|e| NewsreelError::OpmlParse(e.to_string()))
    }
}
