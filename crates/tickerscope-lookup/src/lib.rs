//! Session-aware quotes and translated news for US equities
//!
//! This crate answers two questions about a ticker: what is it trading at
//! right now, and in which session; and what has been written about it
//! lately, in the reader's language. It includes:
//!
//! - An NYSE trading calendar (holidays, early closes) and a session
//!   classifier that works in exchange-local civil time
//! - Quote normalization to fixed-point decimals with staleness and
//!   data-quality checks
//! - News collection from several sources with URL-based dedup inside a
//!   trailing window
//! - Batched, rate-limited translation of headlines and summaries
//! - Clients for Yahoo Finance, Finnhub, Google News, Google Translate and
//!   LibreTranslate
//!
//! # Architecture
//!
//! [`LookupService`] runs the quote path and the news path concurrently.
//! Everything upstream sits behind a trait so tests can swap it:
//! - [`QuoteProvider`]: raw quotes
//! - [`NewsSource`]: raw articles
//! - [`TranslationBackend`]: machine translation
//! - [`ExchangeCalendar`]: trading days and session boundaries
//! - [`Clock`]: the current instant
//!
//! # Example
//!
//! ```rust,no_run
//! use tickerscope_lookup::{Language, LookupConfig, LookupService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = LookupConfig::default().with_env()?;
//!     let service = LookupService::from_config(&config)?;
//!
//!     let result = service.lookup("AAPL", &Language::Chinese, None).await?;
//!     println!("{} is {}", result.ticker, result.phase);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod language;
pub mod lookup;
pub mod news;
pub mod quote;
pub mod session;
pub mod ticker;
pub mod translate;

// Re-export main types for convenience
pub use cache::CachedLookup;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LookupConfig, QuoteSource};
pub use error::{LookupError, Result};
pub use language::{Language, detect_language};
pub use lookup::{LookupResult, LookupService, QuoteSection};
pub use news::{NewsBatch, NewsCollector, NewsItem, NewsSource, NewsWindow, RawArticle};
pub use quote::{DataQualityWarning, Quote, QuoteNormalizer, QuoteProvider, RawQuote};
pub use session::{ExchangeCalendar, NyseCalendar, SessionHours, SessionPhase, classify};
pub use ticker::Ticker;
pub use translate::{BackendKind, TranslationBackend, TranslationOutcome, Translator};
