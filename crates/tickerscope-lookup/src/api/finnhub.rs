//! Finnhub client for quotes and company news

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::{LookupError, Result};
use crate::news::{NewsSource, NewsWindow, RawArticle};
use crate::quote::{QuoteProvider, RawQuote};
use crate::ticker::Ticker;

const BASE_URL: &str = "https://finnhub.io/api/v1";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Finnhub news article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinnhubNewsArticle {
    /// Publish time (UNIX timestamp)
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    /// News source
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: String,
}

impl From<FinnhubNewsArticle> for RawArticle {
    fn from(article: FinnhubNewsArticle) -> Self {
        Self {
            headline: article.headline,
            summary: article.summary,
            url: article.url,
            published_at: Some(article.datetime)
                .filter(|t| *t > 0)
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
            source_name: if article.source.trim().is_empty() {
                "Finnhub".to_string()
            } else {
                article.source
            },
        }
    }
}

/// Finnhub client with rate limiting
#[derive(Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Requests per minute (free tier: 60, premium: 300+)
    pub fn new(api_key: impl Into<String>, rate_limit: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter,
        }
    }

    /// Send requests to another API root
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .query(params)
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| LookupError::ApiError(format!("Finnhub request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::ApiError(format!(
                "Finnhub API error {status}: {body}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LookupError::ApiError(format!("Failed to parse Finnhub response: {e}")))
    }

    /// Get company news for a symbol between two dates (inclusive)
    pub async fn get_company_news(
        &self,
        symbol: &str,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    ) -> Result<Vec<FinnhubNewsArticle>> {
        let value = self
            .get_json(
                "/company-news",
                &[
                    ("symbol", symbol.to_string()),
                    ("from", from.format("%Y-%m-%d").to_string()),
                    ("to", to.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl QuoteProvider for FinnhubClient {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_quote(&self, ticker: &Ticker) -> Result<RawQuote> {
        let value = self
            .get_json("/quote", &[("symbol", ticker.to_string())])
            .await?;
        let raw = RawQuote::from_json(ticker.as_str(), QuoteProvider::name(self), &value)?;

        // Unknown symbols come back as all zeros
        if raw.last_price.is_none_or(|p| p == 0.0) && raw.timestamp.is_none() {
            return Err(LookupError::quote_unavailable(
                ticker.as_str(),
                "finnhub has no data for this symbol",
            ));
        }
        Ok(raw)
    }
}

#[async_trait]
impl NewsSource for FinnhubClient {
    fn name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch(&self, ticker: &Ticker, window: &NewsWindow) -> Result<Vec<RawArticle>> {
        let articles = self
            .get_company_news(
                ticker.as_str(),
                window.start.date_naive(),
                window.end.date_naive(),
            )
            .await?;
        Ok(articles.into_iter().map(RawArticle::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finnhub_client_creation() {
        let client = FinnhubClient::new("test_key", 60).with_base_url("http://localhost:9/api/");
        assert_eq!(client.api_key, "test_key");
        assert_eq!(client.base_url, "http://localhost:9/api");
    }

    #[test]
    fn test_zero_rate_limit_does_not_panic() {
        let client = FinnhubClient::new("k", 0);
        assert!(client.rate_limiter.check().is_ok());
    }

    #[test]
    fn test_article_conversion() {
        let articles: Vec<FinnhubNewsArticle> = serde_json::from_str(
            r#"[
                {"category":"company","datetime":1718044200,"headline":"Apple WWDC recap","id":1,
                 "image":"","related":"AAPL","source":"MarketWatch","summary":"Keynote notes",
                 "url":"https://www.marketwatch.com/story/wwdc"},
                {"datetime":0,"headline":"No date","source":"","url":"https://x.com/a"}
            ]"#,
        )
        .unwrap();

        let raw: Vec<RawArticle> = articles.into_iter().map(RawArticle::from).collect();
        assert_eq!(raw[0].source_name, "MarketWatch");
        assert_eq!(raw[0].published_at.unwrap().timestamp(), 1_718_044_200);
        assert_eq!(raw[1].source_name, "Finnhub");
        assert!(raw[1].published_at.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let client = FinnhubClient::new("k", 60).with_base_url("http://127.0.0.1:9");
        let ticker = Ticker::parse("AAPL").unwrap();
        let err = client.fetch_quote(&ticker).await.unwrap_err();
        assert!(matches!(err, LookupError::ApiError(_)));
    }

    #[tokio::test]
    #[ignore] // Requires FINNHUB_API_KEY and network access
    async fn test_live_quote() {
        let key = std::env::var("FINNHUB_API_KEY").unwrap();
        let client = FinnhubClient::new(key, 60);
        let quote = client
            .fetch_quote(&Ticker::parse("AAPL").unwrap())
            .await
            .unwrap();
        assert!(quote.last_price.unwrap() > 0.0);
    }
}
