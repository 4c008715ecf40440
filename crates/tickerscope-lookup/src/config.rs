//! Configuration for lookups

use crate::error::{LookupError, Result};
use crate::language::Language;
use crate::news::MAX_WINDOW_DAYS;
use crate::session::SessionHours;
use crate::translate::BackendKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tickerscope_utils::{env_duration_secs, env_parse, env_string};

/// Where quotes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    /// Yahoo Finance (default, no API key required)
    #[default]
    Yahoo,
    /// Finnhub (requires API key)
    Finnhub,
}

impl std::str::FromStr for QuoteSource {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "finnhub" => Ok(Self::Finnhub),
            other => Err(LookupError::ConfigError(format!("unknown quote source {other:?}"))),
        }
    }
}

/// Configuration for lookup operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Language news is translated into when the caller does not say
    pub default_language: Language,

    /// Trailing news window in days
    pub window_days: u32,

    /// Cap on news items per lookup; `None` keeps everything in the window
    pub max_news_items: Option<usize>,

    /// Quote provider to use
    pub quote_source: QuoteSource,

    /// Timeout for one quote request
    pub quote_timeout: Duration,

    /// Timeout for one news source
    pub news_source_timeout: Duration,

    /// Timeout for one translation chunk
    pub translation_timeout: Duration,

    /// Texts per translation request
    pub translation_batch_size: usize,

    /// Translation requests per minute
    pub translation_rate_limit: u32,

    /// Translation backend to build
    pub translation_backend: BackendKind,

    /// LibreTranslate server root, required for [`BackendKind::Libre`]
    pub libretranslate_url: Option<String>,

    /// LibreTranslate API key (optional)
    pub libretranslate_api_key: Option<String>,

    /// Quote age beyond which a quote is stale during trading sessions
    pub freshness_threshold: Duration,

    /// Quote age beyond which a quote is stale while the market is closed
    pub closed_freshness_threshold: Duration,

    /// Exchange session boundaries
    pub session_hours: SessionHours,

    /// First year the holiday rules are trusted for
    pub calendar_first_year: i32,

    /// Last year the holiday rules are trusted for
    pub calendar_last_year: i32,

    /// How long [`CachedLookup`](crate::cache::CachedLookup) keeps results
    pub cache_ttl: Duration,

    /// Finnhub API key (optional; enables Finnhub news)
    pub finnhub_api_key: Option<String>,

    /// Finnhub requests per minute (free tier: 60)
    pub finnhub_rate_limit: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            default_language: Language::Chinese,
            window_days: 7,
            max_news_items: Some(8),
            quote_source: QuoteSource::Yahoo,
            quote_timeout: Duration::from_secs(10),
            news_source_timeout: Duration::from_secs(5),
            translation_timeout: Duration::from_secs(10),
            translation_batch_size: 16,
            translation_rate_limit: 60,
            translation_backend: BackendKind::Google,
            libretranslate_url: None,
            libretranslate_api_key: None,
            freshness_threshold: Duration::from_secs(15 * 60),     // 15 minutes
            closed_freshness_threshold: Duration::from_secs(4 * 24 * 3600), // 4 days
            session_hours: SessionHours::default(),
            calendar_first_year: 2000,
            calendar_last_year: 2099,
            cache_ttl: Duration::from_secs(60),
            finnhub_api_key: None,
            finnhub_rate_limit: 60,
        }
    }
}

impl LookupConfig {
    /// Create a new configuration builder
    pub fn builder() -> LookupConfigBuilder {
        LookupConfigBuilder::default()
    }

    /// Override fields from `TICKERSCOPE_*` variables and `FINNHUB_API_KEY`
    ///
    /// Unset or blank variables leave the field alone; unparseable ones are
    /// an error. The result is validated.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(lang) = env_string("TICKERSCOPE_LANG") {
            self.default_language = Language::from_code(&lang);
        }
        if let Some(days) = env_parse("TICKERSCOPE_WINDOW_DAYS")? {
            self.window_days = days;
        }
        if let Some(max) = env_parse::<usize>("TICKERSCOPE_MAX_NEWS")? {
            self.max_news_items = (max > 0).then_some(max);
        }
        if let Some(source) = env_string("TICKERSCOPE_QUOTE_SOURCE") {
            self.quote_source = source.parse()?;
        }
        if let Some(t) = env_duration_secs("TICKERSCOPE_QUOTE_TIMEOUT_SECS")? {
            self.quote_timeout = t;
        }
        if let Some(t) = env_duration_secs("TICKERSCOPE_NEWS_TIMEOUT_SECS")? {
            self.news_source_timeout = t;
        }
        if let Some(t) = env_duration_secs("TICKERSCOPE_TRANSLATION_TIMEOUT_SECS")? {
            self.translation_timeout = t;
        }
        if let Some(size) = env_parse("TICKERSCOPE_TRANSLATION_BATCH_SIZE")? {
            self.translation_batch_size = size;
        }
        if let Some(rate) = env_parse("TICKERSCOPE_TRANSLATION_RATE_LIMIT")? {
            self.translation_rate_limit = rate;
        }
        if let Some(backend) = env_string("TICKERSCOPE_TRANSLATOR") {
            self.translation_backend = backend.parse()?;
        }
        if let Some(url) = env_string("TICKERSCOPE_LIBRETRANSLATE_URL") {
            self.libretranslate_url = Some(url);
        }
        if let Some(key) = env_string("TICKERSCOPE_LIBRETRANSLATE_API_KEY") {
            self.libretranslate_api_key = Some(key);
        }
        if let Some(t) = env_duration_secs("TICKERSCOPE_CACHE_TTL_SECS")? {
            self.cache_ttl = t;
        }
        if let Some(key) = env_string("FINNHUB_API_KEY") {
            self.finnhub_api_key = Some(key);
        }
        if let Some(rate) = env_parse("TICKERSCOPE_FINNHUB_RATE_LIMIT")? {
            self.finnhub_rate_limit = rate;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.quote_source == QuoteSource::Finnhub && self.finnhub_api_key.is_none() {
            return Err(LookupError::ConfigError(
                "Finnhub API key required when using the Finnhub quote source".to_string(),
            ));
        }

        if self.translation_backend == BackendKind::Libre && self.libretranslate_url.is_none() {
            return Err(LookupError::ConfigError(
                "LibreTranslate URL required when using the LibreTranslate backend".to_string(),
            ));
        }

        if self.window_days == 0 {
            return Err(LookupError::ConfigError(
                "window_days must be greater than 0".to_string(),
            ));
        }

        if self.window_days > MAX_WINDOW_DAYS {
            return Err(LookupError::ConfigError(format!(
                "window_days must be at most {MAX_WINDOW_DAYS}"
            )));
        }

        if self.translation_batch_size == 0 {
            return Err(LookupError::ConfigError(
                "translation_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.calendar_first_year > self.calendar_last_year {
            return Err(LookupError::ConfigError(format!(
                "calendar year range {}..={} is empty",
                self.calendar_first_year, self.calendar_last_year
            )));
        }

        for (name, timeout) in [
            ("quote_timeout", self.quote_timeout),
            ("news_source_timeout", self.news_source_timeout),
            ("translation_timeout", self.translation_timeout),
        ] {
            if timeout.is_zero() {
                return Err(LookupError::ConfigError(format!("{name} must be non-zero")));
            }
        }

        self.session_hours.validate()
    }
}

/// Builder for LookupConfig
#[derive(Debug, Default)]
pub struct LookupConfigBuilder {
    config: Option<LookupConfig>,
}

impl LookupConfigBuilder {
    fn edit(mut self, f: impl FnOnce(&mut LookupConfig)) -> Self {
        f(self.config.get_or_insert_with(LookupConfig::default));
        self
    }

    /// Set the default target language
    pub fn default_language(self, language: Language) -> Self {
        self.edit(|c| c.default_language = language)
    }

    /// Set the trailing news window
    pub fn window_days(self, days: u32) -> Self {
        self.edit(|c| c.window_days = days)
    }

    /// Set the news cap; `None` disables it
    pub fn max_news_items(self, max: Option<usize>) -> Self {
        self.edit(|c| c.max_news_items = max)
    }

    /// Set the quote provider
    pub fn quote_source(self, source: QuoteSource) -> Self {
        self.edit(|c| c.quote_source = source)
    }

    /// Set the quote request timeout
    pub fn quote_timeout(self, timeout: Duration) -> Self {
        self.edit(|c| c.quote_timeout = timeout)
    }

    /// Set the per-source news timeout
    pub fn news_source_timeout(self, timeout: Duration) -> Self {
        self.edit(|c| c.news_source_timeout = timeout)
    }

    /// Set the per-chunk translation timeout
    pub fn translation_timeout(self, timeout: Duration) -> Self {
        self.edit(|c| c.translation_timeout = timeout)
    }

    /// Set texts per translation request
    pub fn translation_batch_size(self, size: usize) -> Self {
        self.edit(|c| c.translation_batch_size = size)
    }

    /// Set translation requests per minute
    pub fn translation_rate_limit(self, per_minute: u32) -> Self {
        self.edit(|c| c.translation_rate_limit = per_minute)
    }

    /// Choose the translation backend
    pub fn translation_backend(self, backend: BackendKind) -> Self {
        self.edit(|c| c.translation_backend = backend)
    }

    /// Set the LibreTranslate server
    pub fn libretranslate(self, url: impl Into<String>, api_key: Option<String>) -> Self {
        let url = url.into();
        self.edit(|c| {
            c.libretranslate_url = Some(url);
            c.libretranslate_api_key = api_key;
        })
    }

    /// Set both freshness thresholds
    pub fn freshness(self, trading: Duration, closed: Duration) -> Self {
        self.edit(|c| {
            c.freshness_threshold = trading;
            c.closed_freshness_threshold = closed;
        })
    }

    /// Set exchange session boundaries
    pub fn session_hours(self, hours: SessionHours) -> Self {
        self.edit(|c| c.session_hours = hours)
    }

    /// Set the years the calendar answers for
    pub fn calendar_years(self, first: i32, last: i32) -> Self {
        self.edit(|c| {
            c.calendar_first_year = first;
            c.calendar_last_year = last;
        })
    }

    /// Set the lookup cache TTL
    pub fn cache_ttl(self, ttl: Duration) -> Self {
        self.edit(|c| c.cache_ttl = ttl)
    }

    /// Set Finnhub API key
    pub fn finnhub_api_key(self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.edit(|c| c.finnhub_api_key = Some(key))
    }

    /// Set Finnhub requests per minute
    pub fn finnhub_rate_limit(self, per_minute: u32) -> Self {
        self.edit(|c| c.finnhub_rate_limit = per_minute)
    }

    /// Build the configuration
    pub fn build(self) -> Result<LookupConfig> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LookupConfig::default();
        assert_eq!(config.default_language, Language::Chinese);
        assert_eq!(config.window_days, 7);
        assert_eq!(config.max_news_items, Some(8));
        assert_eq!(config.translation_batch_size, 16);
        assert_eq!(config.freshness_threshold, Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LookupConfig::builder()
            .default_language(Language::English)
            .window_days(3)
            .max_news_items(None)
            .quote_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(config.default_language, Language::English);
        assert_eq!(config.window_days, 3);
        assert_eq!(config.max_news_items, None);
        assert_eq!(config.quote_timeout, Duration::from_secs(2));
        // untouched fields keep defaults
        assert_eq!(config.news_source_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_validation_finnhub_no_key() {
        let config = LookupConfig {
            quote_source: QuoteSource::Finnhub,
            finnhub_api_key: None,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_finnhub_with_key() {
        let config = LookupConfig::builder()
            .quote_source(QuoteSource::Finnhub)
            .finnhub_api_key("test_key")
            .build();

        assert!(config.is_ok());
    }

    #[test]
    fn test_validation_libre_needs_url() {
        assert!(
            LookupConfig::builder()
                .translation_backend(BackendKind::Libre)
                .build()
                .is_err()
        );
        assert!(
            LookupConfig::builder()
                .translation_backend(BackendKind::Libre)
                .libretranslate("http://localhost:5000", None)
                .build()
                .is_ok()
        );
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        assert!(LookupConfig::builder().window_days(0).build().is_err());
        assert!(
            LookupConfig::builder()
                .window_days(MAX_WINDOW_DAYS + 1)
                .build()
                .is_err()
        );
        assert!(LookupConfig::builder().translation_batch_size(0).build().is_err());
        assert!(LookupConfig::builder().quote_timeout(Duration::ZERO).build().is_err());
        assert!(LookupConfig::builder().calendar_years(2030, 2020).build().is_err());
    }

    #[test]
    fn test_quote_source_from_str() {
        assert_eq!("Yahoo".parse::<QuoteSource>().unwrap(), QuoteSource::Yahoo);
        assert_eq!("finnhub".parse::<QuoteSource>().unwrap(), QuoteSource::Finnhub);
        assert!("bloomberg".parse::<QuoteSource>().is_err());
    }

    #[test]
    fn test_serde_round_trip_keeps_backend_names() {
        let json = serde_json::to_value(LookupConfig::default()).unwrap();
        assert_eq!(json["translation_backend"], "google");
        assert_eq!(json["quote_source"], "yahoo");
    }
}
