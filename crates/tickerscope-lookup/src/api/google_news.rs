//! Google News RSS search feed

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;

use crate::error::{LookupError, Result};
use crate::news::{NewsSource, NewsWindow, RawArticle};
use crate::ticker::Ticker;

const FEED_URL: &str = "https://news.google.com/rss/search";
const USER_AGENT: &str = "Mozilla/5.0";
const DEFAULT_PUBLISHER: &str = "Google News";

static ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>").expect("valid item pattern"));

/// Matches `<tag ...>value</tag>` for the tag names used in items
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(title|link|pubDate|description|source)\b[^>]*>(.*?)</(?:title|link|pubDate|description|source)>")
        .expect("valid field pattern")
});

/// Google News RSS client (no key required)
#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    http: Client,
    feed_url: String,
}

impl Default for GoogleNewsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleNewsClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            feed_url: FEED_URL.to_string(),
        }
    }

    pub fn with_feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = url.into();
        self
    }
}

#[async_trait]
impl NewsSource for GoogleNewsClient {
    fn name(&self) -> &'static str {
        "google-news"
    }

    async fn fetch(&self, ticker: &Ticker, _window: &NewsWindow) -> Result<Vec<RawArticle>> {
        // Google rejects requests without a browser-like agent
        let response = self
            .http
            .get(&self.feed_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("q", format!("{ticker} stock")),
                ("hl", "en-US".to_string()),
                ("gl", "US".to_string()),
                ("ceid", "US:en".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LookupError::ApiError(format!(
                "Google News feed error {status}"
            )));
        }

        let body = response.text().await?;
        Ok(parse_feed(&body))
    }
}

/// Extract the items of an RSS 2.0 document
///
/// Field text is returned raw (entities and markup intact); the collector
/// cleans it. Items whose `pubDate` is not RFC 2822 get no timestamp.
pub fn parse_feed(xml: &str) -> Vec<RawArticle> {
    ITEM.captures_iter(xml)
        .map(|item| {
            let mut article = RawArticle {
                source_name: DEFAULT_PUBLISHER.to_string(),
                ..RawArticle::default()
            };

            for field in FIELD.captures_iter(&item[1]) {
                let value = field[2].trim();
                match &field[1] {
                    "title" => article.headline = value.to_string(),
                    "link" => article.url = unwrap_cdata(value).to_string(),
                    "description" => article.summary = value.to_string(),
                    "pubDate" => {
                        article.published_at = DateTime::parse_from_rfc2822(value)
                            .ok()
                            .map(|dt| dt.with_timezone(&Utc));
                    }
                    "source" if !value.is_empty() => article.source_name = value.to_string(),
                    _ => {}
                }
            }
            article
        })
        .collect()
}

fn unwrap_cdata(value: &str) -> &str {
    value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
        .unwrap_or(value)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
<title>"AAPL stock" - Google News</title>
<item>
  <title>Apple stock climbs after WWDC &amp; AI push - Reuters</title>
  <link>https://news.google.com/rss/articles/CBMiAbc?oc=5</link>
  <guid isPermaLink="false">CBMiAbc</guid>
  <pubDate>Mon, 10 Jun 2024 14:05:00 GMT</pubDate>
  <description>&lt;a href="https://news.google.com/rss/articles/CBMiAbc"&gt;Apple stock climbs&lt;/a&gt;</description>
  <source url="https://www.reuters.com">Reuters</source>
</item>
<item>
  <title>Undated story</title>
  <link>https://news.google.com/rss/articles/CBMiDef</link>
  <pubDate>yesterday</pubDate>
</item>
</channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let items = parse_feed(FEED);
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.headline, "Apple stock climbs after WWDC &amp; AI push - Reuters");
        assert_eq!(first.url, "https://news.google.com/rss/articles/CBMiAbc?oc=5");
        assert_eq!(first.source_name, "Reuters");
        assert_eq!(
            first.published_at.unwrap().to_rfc3339(),
            "2024-06-10T14:05:00+00:00"
        );
        assert!(first.summary.contains("Apple stock climbs"));

        let second = &items[1];
        assert_eq!(second.source_name, "Google News");
        assert!(second.published_at.is_none());
    }

    #[test]
    fn test_parse_feed_without_items() {
        assert!(parse_feed("<rss><channel></channel></rss>").is_empty());
        assert!(parse_feed("not xml at all").is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_feed() {
        let client = GoogleNewsClient::new();
        let ticker = Ticker::parse("AAPL").unwrap();
        let items = client
            .fetch(&ticker, &NewsWindow::trailing(Utc::now(), 7))
            .await
            .unwrap();
        assert!(!items.is_empty());
    }
}
