//! Yahoo Finance client: daily-bar quotes and search-endpoint news

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use yahoo_finance_api as yahoo;

use crate::error::{LookupError, Result};
use crate::news::{NewsSource, NewsWindow, RawArticle};
use crate::quote::{QuoteProvider, RawQuote};
use crate::ticker::Ticker;

const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const USER_AGENT: &str = "Mozilla/5.0";

/// Yahoo Finance API client
#[derive(Debug, Clone)]
pub struct YahooFinanceClient {
    http: Client,
    search_url: String,
    news_count: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchNewsItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: String,
    #[serde(default)]
    provider_publish_time: Option<i64>,
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            search_url: SEARCH_URL.to_string(),
            news_count: 20,
        }
    }

    /// Point news requests at another search endpoint
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Number of articles requested from the search endpoint
    pub fn with_news_count(mut self, count: usize) -> Self {
        self.news_count = count;
        self
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    /// Latest daily close as the last price, the bar before it as the
    /// previous close
    async fn fetch_quote(&self, ticker: &Ticker) -> Result<RawQuote> {
        let symbol = ticker.yahoo_symbol();
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| LookupError::YahooFinanceError(e.to_string()))?;

        let response = provider
            .get_quote_range(&symbol, "1d", "5d")
            .await
            .map_err(|e| LookupError::quote_unavailable(ticker.as_str(), e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| LookupError::quote_unavailable(ticker.as_str(), e.to_string()))?;

        let Some(last) = quotes.last() else {
            return Err(LookupError::quote_unavailable(
                ticker.as_str(),
                "yahoo returned no price bars",
            ));
        };
        let previous = quotes.len().checked_sub(2).and_then(|i| quotes.get(i));

        Ok(RawQuote {
            symbol: ticker.to_string(),
            last_price: Some(last.close),
            previous_close: previous.map(|q| q.close),
            currency: response.metadata().ok().and_then(|m| m.currency.clone()),
            timestamp: DateTime::from_timestamp(last.timestamp as i64, 0),
            source: QuoteProvider::name(self).to_string(),
            ..RawQuote::default()
        })
    }
}

#[async_trait]
impl NewsSource for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &Ticker, _window: &NewsWindow) -> Result<Vec<RawArticle>> {
        let response = self
            .http
            .get(&self.search_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("q", ticker.yahoo_symbol()),
                ("quotesCount", "0".to_string()),
                ("newsCount", self.news_count.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LookupError::ApiError(format!(
                "Yahoo search error {status}"
            )));
        }

        let body: SearchResponse = response.json().await?;
        Ok(parse_search_news(body))
    }
}

fn parse_search_news(body: SearchResponse) -> Vec<RawArticle> {
    body.news
        .into_iter()
        .map(|item| RawArticle {
            headline: item.title,
            summary: String::new(),
            url: item.link,
            published_at: item
                .provider_publish_time
                .filter(|t| *t > 0)
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
            source_name: item
                .publisher
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "Yahoo Finance".to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_news() {
        let body: SearchResponse = serde_json::from_str(
            r#"{
                "count": 2,
                "quotes": [],
                "news": [
                    {
                        "uuid": "abc",
                        "title": "Apple unveils Apple Intelligence",
                        "publisher": "Reuters",
                        "link": "https://finance.yahoo.com/news/apple-intelligence.html",
                        "providerPublishTime": 1718044200,
                        "type": "STORY"
                    },
                    {
                        "title": "Undated story",
                        "link": "https://finance.yahoo.com/news/undated.html"
                    }
                ]
            }"#,
        )
        .unwrap();

        let articles = parse_search_news(body);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source_name, "Reuters");
        assert_eq!(articles[0].published_at.unwrap().timestamp(), 1_718_044_200);
        assert_eq!(articles[1].source_name, "Yahoo Finance");
        assert!(articles[1].published_at.is_none());
    }

    #[test]
    fn test_parse_search_without_news() {
        let body: SearchResponse = serde_json::from_str(r#"{"quotes": []}"#).unwrap();
        assert!(parse_search_news(body).is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_quote() {
        let client = YahooFinanceClient::new();
        let ticker = Ticker::parse("AAPL").unwrap();
        let quote = client.fetch_quote(&ticker).await.unwrap();
        assert!(quote.last_price.unwrap() > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_news() {
        let client = YahooFinanceClient::new();
        let ticker = Ticker::parse("AAPL").unwrap();
        let now = Utc::now();
        let articles = client
            .fetch(&ticker, &NewsWindow::trailing(now, 7))
            .await
            .unwrap();
        assert!(!articles.is_empty());
    }
}
