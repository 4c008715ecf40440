//! Time-boxed cache in front of [`LookupService`]

use cached::{Cached, TimedCache};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::language::Language;
use crate::lookup::{LookupResult, LookupService};
use crate::ticker::Ticker;

/// Cache key for one lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub ticker: Ticker,
    /// Target language code
    pub language: String,
    pub window_days: u32,
}

impl CacheKey {
    pub fn new(ticker: Ticker, language: &Language, window_days: u32) -> Self {
        Self {
            ticker,
            language: language.code().to_string(),
            window_days,
        }
    }
}

/// Thread-safe cache of [`LookupResult`]s
///
/// Repeated lookups of the same ticker, language and window inside the TTL
/// return the stored result, `generated_at` included.
pub struct CachedLookup {
    service: Arc<LookupService>,
    cache: Arc<RwLock<TimedCache<CacheKey, LookupResult>>>,
}

impl Clone for CachedLookup {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl CachedLookup {
    /// Create a new cache with specified TTL
    pub fn new(service: LookupService, ttl: Duration) -> Self {
        Self {
            service: Arc::new(service),
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub fn service(&self) -> &LookupService {
        &self.service
    }

    /// Cached [`LookupService::lookup`]
    ///
    /// Errors are not cached.
    pub async fn lookup(
        &self,
        ticker: &str,
        target: &Language,
        window_days: Option<u32>,
    ) -> Result<LookupResult> {
        let parsed = Ticker::parse(ticker)?;
        let window_days = window_days.unwrap_or(self.service.window_days());
        let key = CacheKey::new(parsed, target, window_days);

        if let Some(hit) = self.get(&key).await {
            tracing::debug!(?key, "lookup cache hit");
            return Ok(hit);
        }

        tracing::debug!(?key, "lookup cache miss");
        let result = self
            .service
            .lookup(key.ticker.as_str(), target, Some(window_days))
            .await?;

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, result.clone());
        Ok(result)
    }

    async fn get(&self, key: &CacheKey) -> Option<LookupResult> {
        // TimedCache evicts on read, so even a lookup needs the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Drop the cached result for one key
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    /// Get the number of cached entries
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::LookupError;
    use crate::news::test_support::at;
    use crate::quote::{MockQuoteProvider, RawQuote};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cached(calls: Arc<AtomicUsize>) -> CachedLookup {
        let now = at("2024-06-10T18:30:00Z");
        let mut provider = MockQuoteProvider::new();
        provider.expect_name().return_const("mock");
        provider.expect_fetch_quote().returning(move |ticker| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawQuote {
                symbol: ticker.to_string(),
                last_price: Some(100.0),
                previous_close: Some(99.0),
                timestamp: Some(now),
                source: "mock".to_string(),
                ..RawQuote::default()
            })
        });

        let service = LookupService::builder()
            .quote_provider(Arc::new(provider))
            .clock(Arc::new(FixedClock::new(now)))
            .build()
            .unwrap();
        CachedLookup::new(service, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_repeat_lookup_hits_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cached(Arc::clone(&calls));

        let first = cache.lookup("AAPL", &Language::Chinese, None).await.unwrap();
        let second = cache.lookup(" aapl ", &Language::Chinese, Some(7)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_key_includes_language_and_window() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cached(Arc::clone(&calls));

        cache.lookup("AAPL", &Language::Chinese, Some(7)).await.unwrap();
        cache.lookup("AAPL", &Language::English, Some(7)).await.unwrap();
        cache.lookup("AAPL", &Language::Chinese, Some(3)).await.unwrap();
        cache.lookup("MSFT", &Language::Chinese, Some(7)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.len().await, 4);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cached(Arc::clone(&calls));

        let err = cache.lookup("NOT A TICKER", &Language::Chinese, None).await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidTicker(_)));
        assert!(cache.is_empty().await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = cached(Arc::clone(&calls));

        cache.lookup("AAPL", &Language::Chinese, None).await.unwrap();
        cache.lookup("MSFT", &Language::Chinese, None).await.unwrap();

        let key = CacheKey::new(Ticker::parse("AAPL").unwrap(), &Language::Chinese, 7);
        cache.invalidate(&key).await;
        assert_eq!(cache.len().await, 1);

        cache.lookup("AAPL", &Language::Chinese, None).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
