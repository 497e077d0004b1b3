use chrono::Utc;
use feed_rs::parser;
use reqwest::blocking::Client;

use crate::domain::CandidateItem;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::traits::{FeedMeta, ParsedFeed};

/// User-Agent sent by the primary strategy: a single honest identity.
pub const PRIMARY_USER_AGENT: &str =
    "newsreel/0.1 (RSS/Atom ingestion; +https://github.com/ogomez92/newsreel)";

/// Primary parse strategy: one GET with a fixed User-Agent, body handed to
/// the standards-compliant feed-rs parser.
pub fn parse(client: &Client, url: &str) -> NewsreelResult<ParsedFeed> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, PRIMARY_USER_AGENT)
        .send()?
        .error_for_status()?;

    let bytes = response.bytes()?;
    parse_bytes(&bytes)
}

pub fn parse_bytes(bytes: &[u8]) -> NewsreelResult<ParsedFeed> {
    let feed = parser::parse(bytes).map_err(|e| NewsreelError::FeedParse(e.to_string()))?;

    let meta = FeedMeta {
        title: feed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled Feed".to_string()),
        description: feed.description.map(|d| d.content),
        link: feed.links.first().map(|l| l.href.clone()),
        language: feed.language,
    };

    let items = feed.entries.into_iter().map(normalize_entry).collect();

    Ok(ParsedFeed { meta, items })
}

fn normalize_entry(entry: feed_rs::model::Entry) -> CandidateItem {
    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "Untitled Article".to_string());

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    // First available content synonym wins
    let raw_content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.map(|s| s.content))
        .unwrap_or_default();

    let pub_date = entry
        .published
        .or(entry.updated)
        .unwrap_or_else(Utc::now);

    let author = entry
        .authors
        .first()
        .map(|p| p.name.clone())
        .filter(|n| !n.trim().is_empty());

    let guid = if entry.id.trim().is_empty() {
        Some(link.clone()).filter(|l| !l.is_empty())
    } else {
        Some(entry.id)
    };

    let categories = entry
        .categories
        .into_iter()
        .map(|c| c.term)
        .filter(|t| !t.is_empty())
        .collect();

    CandidateItem::new(title, link, raw_content)
        .with_pub_date(pub_date)
        .with_author(author)
        .with_guid(guid)
        .with_categories(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Rust Blog</title>
    <link>https://blog.rust-lang.org/</link>
    <description>Empowering everyone to build reliable and efficient software.</description>
    <language>en-US</language>
    <item>
      <title>Announcing Rust 1.75.0</title>
      <link>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</link>
      <description><![CDATA[<p>This release includes async fn in traits.</p>]]></description>
      <pubDate>Thu, 28 Dec 2023 00:00:00 +0000</pubDate>
      <guid>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</guid>
      <category>releases</category>
    </item>
    <item>
      <link>https://blog.rust-lang.org/2024/01/10/Rust-2024-CFT.html</link>
      <description><![CDATA[<p>We're testing the next edition of Rust!</p>]]></description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_meta() {
        let parsed = parse_bytes(SAMPLE_RSS).unwrap();
        assert_eq!(parsed.meta.title, "Rust Blog");
        assert_eq!(
            parsed.meta.link.as_deref(),
            Some("https://blog.rust-lang.org/")
        );
        assert_eq!(parsed.meta.language.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_normalize_full_item() {
        let parsed = parse_bytes(SAMPLE_RSS).unwrap();
        let item = &parsed.items[0];

        assert_eq!(item.title, "Announcing Rust 1.75.0");
        assert_eq!(
            item.link,
            "https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html"
        );
        assert!(item.raw_content.contains("async fn in traits"));
        assert_eq!(
            item.guid.as_deref(),
            Some("https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html")
        );
        assert_eq!(item.categories, vec!["releases".to_string()]);
    }

    #[test]
    fn test_missing_title_gets_placeholder() {
        let parsed = parse_bytes(SAMPLE_RSS).unwrap();
        assert_eq!(parsed.items[1].title, "Untitled Article");
    }

    #[test]
    fn test_missing_pub_date_defaults_to_now() {
        let before = Utc::now();
        let parsed = parse_bytes(SAMPLE_RSS).unwrap();
        let after = Utc::now();

        let item = &parsed.items[1];
        assert!(item.pub_date >= before && item.pub_date <= after);
    }

    #[test]
    fn test_unparseable_body_rejected() {
        let result = parse_bytes(b"this is not xml at all");
        assert!(matches!(result, Err(NewsreelError::FeedParse(_))));
    }
}
