//! One lookup: session, quote and translated news for a ticker

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{FinnhubClient, GoogleNewsClient, YahooFinanceClient};
use crate::clock::{Clock, SystemClock};
use crate::config::{LookupConfig, QuoteSource};
use crate::error::{LookupError, Result};
use crate::language::Language;
use crate::news::{MAX_WINDOW_DAYS, NewsBatch, NewsCollector, NewsSource};
use crate::quote::{Quote, QuoteNormalizer, QuoteProvider};
use crate::session::{ExchangeCalendar, NyseCalendar, SessionPhase, classify};
use crate::ticker::Ticker;
use crate::translate::{
    BackendKind, GoogleTranslateBackend, LibreTranslateBackend, TranslationBackend, Translator,
};

/// The quote half of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteSection {
    Available(Quote),
    Unavailable { reason: String },
}

impl QuoteSection {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Available(quote) => Some(quote),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Everything one lookup produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub ticker: Ticker,
    /// Session phase at lookup time
    pub phase: SessionPhase,
    pub quote: QuoteSection,
    pub news: NewsBatch,
    /// Language news was translated into
    pub language: Language,
    pub generated_at: DateTime<Utc>,
    /// Degradations the user should know about
    pub notices: Vec<String>,
}

/// Composes session classification, quoting, news collection and
/// translation
pub struct LookupService {
    quote_provider: Arc<dyn QuoteProvider>,
    calendar: Arc<dyn ExchangeCalendar>,
    normalizer: QuoteNormalizer,
    collector: NewsCollector,
    translator: Option<Translator>,
    clock: Arc<dyn Clock>,
    quote_timeout: Duration,
    window_days: u32,
    default_language: Language,
}

impl LookupService {
    pub fn builder() -> LookupServiceBuilder {
        LookupServiceBuilder::default()
    }

    /// Wire the network clients selected by `config`
    pub fn from_config(config: &LookupConfig) -> Result<Self> {
        config.validate()?;

        let yahoo = Arc::new(YahooFinanceClient::new());
        let finnhub = config
            .finnhub_api_key
            .as_ref()
            .map(|key| Arc::new(FinnhubClient::new(key.clone(), config.finnhub_rate_limit)));

        let quote_provider: Arc<dyn QuoteProvider> = match (config.quote_source, &finnhub) {
            (QuoteSource::Yahoo, _) => yahoo.clone(),
            (QuoteSource::Finnhub, Some(client)) => client.clone(),
            (QuoteSource::Finnhub, None) => {
                return Err(LookupError::ConfigError(
                    "Finnhub API key required when using the Finnhub quote source".to_string(),
                ));
            }
        };

        let mut collector = NewsCollector::new(config.news_source_timeout)
            .with_max_items(config.max_news_items)
            .with_source(yahoo);
        if let Some(client) = finnhub {
            collector = collector.with_source(client);
        }
        collector = collector.with_source(Arc::new(GoogleNewsClient::new()));

        let backend: Option<Arc<dyn TranslationBackend>> = match config.translation_backend {
            BackendKind::Google => Some(Arc::new(GoogleTranslateBackend::new())),
            BackendKind::Libre => {
                let url = config.libretranslate_url.clone().ok_or_else(|| {
                    LookupError::ConfigError("LibreTranslate URL is not set".to_string())
                })?;
                Some(Arc::new(LibreTranslateBackend::new(
                    url,
                    config.libretranslate_api_key.clone(),
                )))
            }
            BackendKind::None => None,
        };

        let mut builder = Self::builder()
            .quote_provider(quote_provider)
            .calendar(Arc::new(NyseCalendar::new(
                config.session_hours,
                config.calendar_first_year,
                config.calendar_last_year,
            )))
            .normalizer(QuoteNormalizer::new(
                config.freshness_threshold,
                config.closed_freshness_threshold,
            ))
            .collector(collector)
            .quote_timeout(config.quote_timeout)
            .window_days(config.window_days)
            .default_language(config.default_language.clone());

        if let Some(backend) = backend {
            builder = builder.translator(Translator::new(
                backend,
                config.translation_batch_size,
                config.translation_timeout,
                config.translation_rate_limit,
            ));
        }

        builder.build()
    }

    pub fn default_language(&self) -> &Language {
        &self.default_language
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    /// Look up `ticker`, translating news into `target`
    ///
    /// Only a malformed ticker is an error, raised before any network call.
    /// `window_days` is capped at [`MAX_WINDOW_DAYS`].
    /// Provider, news and translation failures degrade the result instead.
    pub async fn lookup(
        &self,
        ticker: &str,
        target: &Language,
        window_days: Option<u32>,
    ) -> Result<LookupResult> {
        let ticker = Ticker::parse(ticker)?;
        let window_days = window_days
            .unwrap_or(self.window_days)
            .min(MAX_WINDOW_DAYS);
        let now = self.clock.now();

        tracing::info!(%ticker, language = %target, window_days, "starting lookup");

        let mut notices = Vec::new();
        let phase = match classify(&now, self.calendar.as_ref()) {
            Ok(phase) => phase,
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "calendar unavailable, assuming closed");
                notices.push(format!("Market calendar unavailable ({e}); session shown as CLOSED"));
                SessionPhase::Closed
            }
        };

        let (quote, (news, translation_notices)) = tokio::join!(
            self.quote_section(&ticker, phase),
            self.news_section(&ticker, target, window_days, now),
        );
        notices.extend(translation_notices);

        let result = LookupResult {
            ticker,
            phase,
            quote,
            news,
            language: target.clone(),
            generated_at: self.clock.now(),
            notices,
        };

        tracing::info!(
            ticker = %result.ticker,
            phase = %result.phase,
            quote = result.quote.quote().is_some(),
            news = result.news.len(),
            "lookup finished"
        );
        Ok(result)
    }

    async fn quote_section(&self, ticker: &Ticker, phase: SessionPhase) -> QuoteSection {
        let fetched =
            match tokio::time::timeout(self.quote_timeout, self.quote_provider.fetch_quote(ticker))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(LookupError::timeout(
                    format!("{} quote", self.quote_provider.name()),
                    self.quote_timeout,
                )),
            };

        let quote = fetched.and_then(|raw| {
            self.normalizer
                .normalize(raw, ticker, phase, self.clock.now())
        });

        match quote {
            Ok(quote) => QuoteSection::Available(quote),
            Err(e) => {
                tracing::warn!(%ticker, provider = self.quote_provider.name(), error = %e, "quote unavailable");
                QuoteSection::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn news_section(
        &self,
        ticker: &Ticker,
        target: &Language,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> (NewsBatch, Vec<String>) {
        let batch = self.collector.collect_at(ticker, window_days, now).await;

        match &self.translator {
            Some(translator) if !batch.is_empty() => {
                let outcome = translator.translate(batch, target).await;
                (outcome.batch, outcome.notices)
            }
            _ => (batch, Vec::new()),
        }
    }
}

/// Builder for [`LookupService`]
#[derive(Default)]
pub struct LookupServiceBuilder {
    quote_provider: Option<Arc<dyn QuoteProvider>>,
    calendar: Option<Arc<dyn ExchangeCalendar>>,
    normalizer: Option<QuoteNormalizer>,
    collector: Option<NewsCollector>,
    news_sources: Vec<Arc<dyn NewsSource>>,
    translator: Option<Translator>,
    clock: Option<Arc<dyn Clock>>,
    quote_timeout: Option<Duration>,
    window_days: Option<u32>,
    default_language: Option<Language>,
}

impl LookupServiceBuilder {
    pub fn quote_provider(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        self.quote_provider = Some(provider);
        self
    }

    pub fn calendar(mut self, calendar: Arc<dyn ExchangeCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn normalizer(mut self, normalizer: QuoteNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Use a fully configured collector; sources added with
    /// [`news_source`](Self::news_source) are appended to it
    pub fn collector(mut self, collector: NewsCollector) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn news_source(mut self, source: Arc<dyn NewsSource>) -> Self {
        self.news_sources.push(source);
        self
    }

    pub fn translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn quote_timeout(mut self, timeout: Duration) -> Self {
        self.quote_timeout = Some(timeout);
        self
    }

    pub fn window_days(mut self, days: u32) -> Self {
        self.window_days = Some(days);
        self
    }

    pub fn default_language(mut self, language: Language) -> Self {
        self.default_language = Some(language);
        self
    }

    pub fn build(self) -> Result<LookupService> {
        let defaults = LookupConfig::default();

        let quote_provider = self
            .quote_provider
            .ok_or_else(|| LookupError::ConfigError("a quote provider is required".to_string()))?;

        let mut collector = self
            .collector
            .unwrap_or_else(|| {
                NewsCollector::new(defaults.news_source_timeout)
                    .with_max_items(defaults.max_news_items)
            });
        for source in self.news_sources {
            collector = collector.with_source(source);
        }

        Ok(LookupService {
            quote_provider,
            calendar: self
                .calendar
                .unwrap_or_else(|| Arc::new(NyseCalendar::default())),
            normalizer: self.normalizer.unwrap_or_default(),
            collector,
            translator: self.translator,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            quote_timeout: self.quote_timeout.unwrap_or(defaults.quote_timeout),
            window_days: self.window_days.unwrap_or(defaults.window_days),
            default_language: self.default_language.unwrap_or(defaults.default_language),
        })
    }
}
