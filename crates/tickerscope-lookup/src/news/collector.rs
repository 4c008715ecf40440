//! Fan-out over news sources, then filter, dedup and order

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::text::clean_text;
use super::url::normalize_url;
use super::{NewsBatch, NewsItem, NewsSource, NewsWindow, RawArticle};
use crate::clock::{Clock, SystemClock};
use crate::error::LookupError;
use crate::language::detect_language;
use crate::ticker::Ticker;

/// Default trailing window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Longest trailing window a lookup will use
pub const MAX_WINDOW_DAYS: u32 = 3650;

/// Queries every registered [`NewsSource`] and merges the results
pub struct NewsCollector {
    sources: Vec<Arc<dyn NewsSource>>,
    source_timeout: Duration,
    max_items: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl NewsCollector {
    pub fn new(source_timeout: Duration) -> Self {
        Self {
            sources: Vec::new(),
            source_timeout,
            max_items: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Register a source; registration order decides which duplicate wins
    pub fn with_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Keep at most `max` items, newest first
    pub fn with_max_items(mut self, max: Option<usize>) -> Self {
        self.max_items = max;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Collect news about `ticker` from the trailing `window_days`
    pub async fn collect(&self, ticker: &Ticker, window_days: u32) -> NewsBatch {
        self.collect_at(ticker, window_days, self.clock.now()).await
    }

    /// Like [`collect`](Self::collect) with an explicit "now"
    ///
    /// Never fails: a source that errors or times out contributes nothing.
    pub async fn collect_at(
        &self,
        ticker: &Ticker,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> NewsBatch {
        let window = NewsWindow::trailing(now, window_days);

        // join_all yields results in registration order regardless of which
        // source finishes first
        let fetches = self.sources.iter().map(|source| {
            async move {
                let outcome =
                    tokio::time::timeout(self.source_timeout, source.fetch(ticker, &window)).await;
                match outcome {
                    Ok(Ok(articles)) => {
                        tracing::debug!(
                            source = source.name(),
                            %ticker,
                            count = articles.len(),
                            "news source returned articles"
                        );
                        articles
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(source = source.name(), %ticker, error = %e, "news source failed");
                        Vec::new()
                    }
                    Err(_) => {
                        let e = LookupError::timeout(source.name(), self.source_timeout);
                        tracing::warn!(source = source.name(), %ticker, error = %e, "news source timed out");
                        Vec::new()
                    }
                }
            }
        });

        let per_source = join_all(fetches).await;
        let mut batch = merge(per_source.into_iter().flatten(), &window);

        if let Some(max) = self.max_items {
            batch.truncate(max);
        }
        batch
    }
}

/// Filter to the window, clean text, dedup by normalized URL, then order
fn merge(articles: impl IntoIterator<Item = RawArticle>, window: &NewsWindow) -> NewsBatch {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for article in articles {
        let Some(published_at) = article.published_at.filter(|at| window.contains(*at)) else {
            continue;
        };
        let Some(key) = normalize_url(&article.url) else {
            tracing::debug!(url = %article.url, "dropping article without a usable url");
            continue;
        };
        let headline = clean_text(&article.headline);
        if headline.is_empty() {
            continue;
        }
        if !seen.insert(key) {
            continue;
        }

        items.push(NewsItem {
            original_language: detect_language(&headline),
            headline,
            summary: clean_text(&article.summary),
            url: article.url.trim().to_string(),
            published_at,
            source_name: article.source_name,
            translated_headline: None,
            translated_summary: None,
            translated_language: None,
        });
    }

    NewsBatch::from_items(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::language::Language;
    use crate::news::MockNewsSource;
    use crate::news::test_support::at;
    use chrono::Duration as ChronoDuration;

    fn now() -> DateTime<Utc> {
        at("2024-06-10T18:30:00Z")
    }

    fn article(headline: &str, url: &str, published: Option<DateTime<Utc>>, source: &str) -> RawArticle {
        RawArticle {
            headline: headline.to_string(),
            summary: String::new(),
            url: url.to_string(),
            published_at: published,
            source_name: source.to_string(),
        }
    }

    fn source(name: &'static str, articles: Vec<RawArticle>) -> Arc<dyn NewsSource> {
        let mut mock = MockNewsSource::new();
        mock.expect_name().return_const(name);
        mock.expect_fetch()
            .returning(move |_, _| Ok(articles.clone()));
        Arc::new(mock)
    }

    fn failing(name: &'static str) -> Arc<dyn NewsSource> {
        let mut mock = MockNewsSource::new();
        mock.expect_name().return_const(name);
        mock.expect_fetch()
            .returning(|_, _| Err(LookupError::ApiError("503 Service Unavailable".to_string())));
        Arc::new(mock)
    }

    fn aapl() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn collector() -> NewsCollector {
        NewsCollector::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_window_filtering() {
        let n = now();
        let articles = vec![
            article("inside", "https://a.com/1", Some(n - ChronoDuration::days(2)), "A"),
            article("edge", "https://a.com/2", Some(n - ChronoDuration::days(7)), "A"),
            article("too old", "https://a.com/3", Some(n - ChronoDuration::days(8)), "A"),
            article("future", "https://a.com/4", Some(n + ChronoDuration::hours(1)), "A"),
            article("undated", "https://a.com/5", None, "A"),
        ];

        let batch = collector()
            .with_source(source("a", articles))
            .collect_at(&aapl(), 7, n)
            .await;

        let headlines: Vec<_> = batch.iter().map(|i| i.headline.as_str()).collect();
        assert_eq!(headlines, vec!["inside", "edge"]);
        for item in &batch {
            assert!(item.published_at >= n - ChronoDuration::days(7));
            assert!(item.published_at <= n);
        }
    }

    #[tokio::test]
    async fn test_dedup_first_registered_source_wins() {
        let n = now();
        let t = Some(n - ChronoDuration::hours(3));

        let batch = collector()
            .with_source(source(
                "first",
                vec![article("Apple beats", "https://www.example.com/story?utm_source=x", t, "First")],
            ))
            .with_source(source(
                "second",
                vec![article("Apple beats estimates", "http://example.com/story/", t, "Second")],
            ))
            .collect_at(&aapl(), 7, n)
            .await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.items()[0].source_name, "First");
    }

    #[tokio::test]
    async fn test_near_duplicate_headlines_kept() {
        let n = now();
        let t = Some(n - ChronoDuration::hours(3));

        let batch = collector()
            .with_source(source(
                "a",
                vec![
                    article("Apple beats Q2 estimates", "https://a.com/apple-q2", t, "A"),
                    article("Apple beats Q2 estimates.", "https://b.com/apple-q2", t, "B"),
                ],
            ))
            .collect_at(&aapl(), 7, n)
            .await;

        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_source_is_degraded() {
        let n = now();
        let batch = collector()
            .with_source(failing("down"))
            .with_source(source(
                "up",
                vec![article("Apple news", "https://a.com/1", Some(n - ChronoDuration::hours(1)), "Up")],
            ))
            .collect_at(&aapl(), 7, n)
            .await;

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.items()[0].source_name, "Up");
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_batch() {
        let batch = collector()
            .with_source(failing("one"))
            .with_source(failing("two"))
            .collect_at(&aapl(), 7, now())
            .await;
        assert!(batch.is_empty());

        let batch = collector().collect_at(&aapl(), 7, now()).await;
        assert!(batch.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out() {
        struct Slow;

        #[async_trait::async_trait]
        impl NewsSource for Slow {
            fn name(&self) -> &'static str {
                "slow"
            }

            async fn fetch(&self, _: &Ticker, _: &NewsWindow) -> crate::error::Result<Vec<RawArticle>> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(vec![RawArticle::default()])
            }
        }

        let n = now();
        let batch = NewsCollector::new(Duration::from_millis(100))
            .with_source(Arc::new(Slow))
            .with_source(source(
                "fast",
                vec![article("Apple news", "https://a.com/1", Some(n - ChronoDuration::hours(1)), "Fast")],
            ))
            .collect_at(&aapl(), 7, n)
            .await;

        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_cleans_text_and_detects_language() {
        let n = now();
        let batch = collector()
            .with_source(source(
                "a",
                vec![RawArticle {
                    headline: "<b>苹果</b>公司发布&amp;新品".to_string(),
                    summary: "<p>Details&nbsp;here</p>".to_string(),
                    url: "https://a.com/zh".to_string(),
                    published_at: Some(n - ChronoDuration::hours(1)),
                    source_name: "A".to_string(),
                }],
            ))
            .collect_at(&aapl(), 7, n)
            .await;

        let item = &batch.items()[0];
        assert_eq!(item.headline, "苹果 公司发布&新品");
        assert_eq!(item.summary, "Details here");
        assert_eq!(item.original_language, Some(Language::Chinese));
    }

    #[tokio::test]
    async fn test_order_and_cap_are_deterministic() {
        let n = now();
        let t1 = Some(n - ChronoDuration::hours(1));
        let t2 = Some(n - ChronoDuration::hours(2));

        let build = || {
            collector()
                .with_max_items(Some(2))
                .with_source(source(
                    "b",
                    vec![
                        article("older", "https://b.com/1", t2, "Beta"),
                        article("tie b", "https://b.com/2", t1, "Beta"),
                    ],
                ))
                .with_source(source("a", vec![article("tie a", "https://a.com/1", t1, "Alpha")]))
        };

        let first = build().collect_at(&aapl(), 7, n).await;
        let second = build().collect_at(&aapl(), 7, n).await;

        let headlines: Vec<_> = first.iter().map(|i| i.headline.as_str()).collect();
        assert_eq!(headlines, vec!["tie a", "tie b"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_collect_uses_clock() {
        let n = now();
        let batch = collector()
            .with_clock(Arc::new(crate::clock::FixedClock::new(n)))
            .with_source(source(
                "a",
                vec![article("recent", "https://a.com/1", Some(n - ChronoDuration::days(1)), "A")],
            ))
            .collect(&aapl(), DEFAULT_WINDOW_DAYS)
            .await;
        assert_eq!(batch.len(), 1);
    }
}
