use std::thread::sleep;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::domain::CandidateItem;
use crate::errors::{NewsreelError, NewsreelResult};
use crate::parser::traits::{FeedMeta, ParsedFeed};

/// Identities tried by the fallback, strictly in order: common desktop
/// browser signatures first, then a declared bot identity, then a
/// well-known crawler. Some servers only answer one of these.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "newsreel-bot/0.1 (feed fetcher)",
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
];

/// Pause between failed attempts, so the rotation does not itself look like
/// abuse to the remote server.
pub const ATTEMPT_DELAY: Duration = Duration::from_secs(1);

const FEED_ACCEPT: &str =
    "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.7";
const FEED_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Hosts known to reject referer-less requests, matched by substring on the
/// URL. The Referer mimics in-site navigation.
const HOSTILE_HOST_REFERERS: &[(&str, &str)] = &[
    ("politico", "https://www.politico.com/"),
    ("bbc", "https://www.bbc.co.uk/"),
];

pub fn referer_for(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    HOSTILE_HOST_REFERERS
        .iter()
        .find(|(host, _)| lower.contains(host))
        .map(|(_, referer)| *referer)
}

/// Fallback parse strategy: rotate through `USER_AGENTS` until one request
/// both succeeds and yields a parseable body. The body goes through the
/// lenient rss/atom parsers rather than the strict primary one.
pub fn parse(client: &Client, url: &str, attempt_delay: Duration) -> NewsreelResult<ParsedFeed> {
    let mut last_error = NewsreelError::FeedParse("no user agents configured".to_string());

    for (attempt, user_agent) in USER_AGENTS.iter().enumerate() {
        if attempt > 0 {
            sleep(attempt_delay);
        }

        match attempt_fetch(client, url, user_agent) {
            Ok(parsed) => {
                debug!(url, attempt = attempt + 1, "fallback parse succeeded");
                return Ok(parsed);
            }
            Err(e) => {
                debug!(url, attempt = attempt + 1, error = %e, "fallback attempt failed");
                last_error = e;
            }
        }
    }

    Err(NewsreelError::FeedParse(format!(
        "all {} user agents exhausted, last error: {}",
        USER_AGENTS.len(),
        last_error
    )))
}

fn attempt_fetch(client: &Client, url: &str, user_agent: &str) -> NewsreelResult<ParsedFeed> {
    let mut request = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, FEED_ACCEPT)
        .header(ACCEPT_LANGUAGE, FEED_ACCEPT_LANGUAGE);

    if let Some(referer) = referer_for(url) {
        request = request.header(REFERER, referer);
    }

    let response = request.send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(NewsreelError::FeedParse(format!(
            "HTTP {} for {}",
            status, url
        )));
    }

    let bytes = response.bytes()?;
    parse_bytes(&bytes)
}

/// Lenient body parse: RSS first, then Atom. Both are streaming parsers
/// that tolerate more malformed markup than the primary strategy.
pub fn parse_bytes(bytes: &[u8]) -> NewsreelResult<ParsedFeed> {
    match rss::Channel::read_from(bytes) {
        Ok(channel) => return Ok(from_rss(channel)),
        Err(rss_err) => {
            if let Ok(feed) = atom_syndication::Feed::read_from(bytes) {
                return Ok(from_atom(feed));
            }
            Err(NewsreelError::FeedParse(rss_err.to_string()))
        }
    }
}

fn from_rss(channel: rss::Channel) -> ParsedFeed {
    let meta = FeedMeta {
        title: if channel.title().trim().is_empty() {
            "Untitled Feed".to_string()
        } else {
            channel.title().to_string()
        },
        description: Some(channel.description().to_string()).filter(|d| !d.is_empty()),
        link: Some(channel.link().to_string()).filter(|l| !l.is_empty()),
        language: channel.language().map(str::to_string),
    };

    let items = channel.items().iter().map(normalize_rss_item).collect();

    ParsedFeed { meta, items }
}

fn normalize_rss_item(item: &rss::Item) -> CandidateItem {
    let title = item
        .title()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("Untitled Article")
        .to_string();

    let link = item.link().unwrap_or_default().to_string();

    let raw_content = item
        .content()
        .or_else(|| item.description())
        .unwrap_or_default()
        .to_string();

    let pub_date = item
        .pub_date()
        .and_then(parse_date)
        .unwrap_or_else(Utc::now);

    let author = item
        .author()
        .map(str::to_string)
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.creators().first().cloned())
        })
        .filter(|a| !a.trim().is_empty());

    let guid = item
        .guid()
        .map(|g| g.value().to_string())
        .filter(|g| !g.trim().is_empty())
        .or_else(|| Some(link.clone()).filter(|l| !l.is_empty()));

    let categories = item
        .categories()
        .iter()
        .map(|c| c.name().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    CandidateItem::new(title, link, raw_content)
        .with_pub_date(pub_date)
        .with_author(author)
        .with_guid(guid)
        .with_categories(categories)
}

fn from_atom(feed: atom_syndication::Feed) -> ParsedFeed {
    let meta = FeedMeta {
        title: if feed.title().trim().is_empty() {
            "Untitled Feed".to_string()
        } else {
            feed.title().to_string()
        },
        description: feed.subtitle().map(|s| s.to_string()),
        link: feed.links().first().map(|l| l.href().to_string()),
        language: None,
    };

    let items = feed.entries().iter().map(normalize_atom_entry).collect();

    ParsedFeed { meta, items }
}

fn normalize_atom_entry(entry: &atom_syndication::Entry) -> CandidateItem {
    let title = if entry.title().trim().is_empty() {
        "Untitled Article".to_string()
    } else {
        entry.title().to_string()
    };

    let link = entry
        .links()
        .first()
        .map(|l| l.href().to_string())
        .unwrap_or_default();

    let raw_content = entry
        .content()
        .and_then(|c| c.value())
        .map(str::to_string)
        .or_else(|| entry.summary().map(|s| s.to_string()))
        .unwrap_or_default();

    let pub_date = entry
        .published()
        .unwrap_or_else(|| entry.updated())
        .with_timezone(&Utc);

    let author = entry
        .authors()
        .first()
        .map(|p| p.name().to_string())
        .filter(|n| !n.trim().is_empty());

    let guid = Some(entry.id().to_string())
        .filter(|id| !id.trim().is_empty())
        .or_else(|| Some(link.clone()).filter(|l| !l.is_empty()));

    let categories = entry
        .categories()
        .iter()
        .map(|c| c.term().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    CandidateItem::new(title, link, raw_content)
        .with_pub_date(pub_date)
        .with_author(author)
        .with_guid(guid)
        .with_categories(categories)
}

/// RSS dates in the wild: RFC 2822 mostly, RFC 3339 sometimes, plus the
/// occasional bare datetime.
fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
        })
}

/// Validate the URL shape before any fallback attempt burns a request.
pub fn parseable_url(url: &str) -> NewsreelResult<Url> {
    Url::parse(url).map_err(|e| NewsreelError::InvalidUrl(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agents_declared_order() {
        // Browser signatures lead, declared bot and crawler close the list
        assert!(USER_AGENTS[0].contains("Chrome"));
        assert!(USER_AGENTS
            .iter()
            .any(|ua| ua.starts_with("newsreel-bot")));
        assert!(USER_AGENTS.last().unwrap().contains("Googlebot"));

        let bot_pos = USER_AGENTS
            .iter()
            .position(|ua| ua.starts_with("newsreel-bot"))
            .unwrap();
        assert!(bot_pos > 0, "browser signatures come before the bot identity");
    }

    #[test]
    fn test_user_agents_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for ua in USER_AGENTS {
            assert!(seen.insert(ua), "duplicate user agent: {}", ua);
        }
    }

    #[test]
    fn test_attempt_delay_nonzero() {
        assert!(ATTEMPT_DELAY >= Duration::from_millis(500));
    }

    #[test]
    fn test_referer_for_hostile_hosts() {
        assert_eq!(
            referer_for("https://www.politico.com/rss/politicopicks.xml"),
            Some("https://www.politico.com/")
        );
        assert_eq!(
            referer_for("https://feeds.bbci.co.uk/news/rss.xml"),
            Some("https://www.bbc.co.uk/")
        );
        assert_eq!(referer_for("https://blog.rust-lang.org/feed.xml"), None);
    }

    const SAMPLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <link>https://example.com/</link>
    <description>Example feed</description>
    <item>
      <title>First Post</title>
      <link>https://example.com/first</link>
      <description>Hello world</description>
      <pubDate>Thu, 28 Dec 2023 00:00:00 +0000</pubDate>
      <guid isPermaLink="false">post-1</guid>
    </item>
  </channel>
</rss>"#;

    const SAMPLE_ATOM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <link href="https://example.com/"/>
  <id>https://example.com/feed.atom</id>
  <updated>2024-01-15T12:00:00Z</updated>
  <entry>
    <title>Understanding WebAssembly</title>
    <link href="https://example.com/posts/wasm-intro"/>
    <id>https://example.com/posts/wasm-intro</id>
    <updated>2024-01-15T12:00:00Z</updated>
    <summary>Wasm is a binary instruction format</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_lenient_rss_parse() {
        let parsed = parse_bytes(SAMPLE_RSS).unwrap();
        assert_eq!(parsed.meta.title, "Example");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].guid.as_deref(), Some("post-1"));
        assert_eq!(parsed.items[0].raw_content, "Hello world");
    }

    #[test]
    fn test_lenient_atom_parse() {
        let parsed = parse_bytes(SAMPLE_ATOM).unwrap();
        assert_eq!(parsed.meta.title, "Example Atom");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].link, "https://example.com/posts/wasm-intro");
        assert!(parsed.items[0].raw_content.contains("binary instruction"));
    }

    #[test]
    fn test_guid_falls_back_to_link() {
        let xml = br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>https://e.com</link><description>d</description>
<item><title>No guid</title><link>https://e.com/a</link><description>c</description></item>
</channel></rss>"#;
        let parsed = parse_bytes(xml).unwrap();
        assert_eq!(parsed.items[0].guid.as_deref(), Some("https://e.com/a"));
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_date("Thu, 28 Dec 2023 00:00:00 +0000").is_some());
        assert!(parse_date("2024-01-15T12:00:00Z").is_some());
        assert!(parse_date("2024-01-15 12:00:00").is_some());
        assert!(parse_date("next tuesday").is_none());
    }
}
