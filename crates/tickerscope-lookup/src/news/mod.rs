//! News items, batches and the sources they come from

pub mod collector;
pub mod text;
pub mod url;

pub use collector::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, NewsCollector};
pub use url::normalize_url;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::Result;
use crate::language::Language;
use crate::ticker::Ticker;

/// Closed time interval `[start, end]` news must fall within
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl NewsWindow {
    /// Trailing window of `days` × 24 hours ending at `now`
    ///
    /// The length is absolute elapsed time, so a window spanning a DST
    /// change is still exactly `days * 24` hours long. A window reaching past the earliest representable instant starts there.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Self {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end: now }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// An article as a source reports it, before cleanup and dedup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawArticle {
    pub headline: String,
    pub summary: String,
    pub url: String,
    /// `None` when the source gave no usable timestamp
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
}

/// A provider of news articles about a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch articles about `ticker`, ideally restricted to `window`
    ///
    /// Sources may return articles outside the window; the collector filters.
    async fn fetch(&self, ticker: &Ticker, window: &NewsWindow) -> Result<Vec<RawArticle>>;
}

/// One deduplicated article, optionally translated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub summary: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    /// Detected from the headline text
    pub original_language: Option<Language>,
    pub translated_headline: Option<String>,
    pub translated_summary: Option<String>,
    /// Language of the `translated_*` fields
    pub translated_language: Option<Language>,
}

impl NewsItem {
    /// Headline to show: the translation when there is one
    pub fn display_headline(&self) -> &str {
        self.translated_headline.as_deref().unwrap_or(&self.headline)
    }

    /// Summary to show: the translation when there is one
    pub fn display_summary(&self) -> &str {
        self.translated_summary.as_deref().unwrap_or(&self.summary)
    }

    /// Newest first, then source name, then URL
    fn batch_order(&self, other: &Self) -> Ordering {
        other
            .published_at
            .cmp(&self.published_at)
            .then_with(|| self.source_name.cmp(&other.source_name))
            .then_with(|| self.url.cmp(&other.url))
    }
}

/// Articles ordered newest first; ties broken by source name, then URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NewsBatch {
    items: Vec<NewsItem>,
}

impl NewsBatch {
    /// Build a batch, imposing the batch order
    pub fn from_items(mut items: Vec<NewsItem>) -> Self {
        items.sort_by(NewsItem::batch_order);
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NewsItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<NewsItem> {
        self.items
    }

    /// Keep only the first `n` items
    pub fn truncate(&mut self, n: usize) {
        self.items.truncate(n);
    }
}

impl<'a> IntoIterator for &'a NewsBatch {
    type Item = &'a NewsItem;
    type IntoIter = std::slice::Iter<'a, NewsItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
