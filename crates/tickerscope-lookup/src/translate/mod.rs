//! Batch translation of news headlines and summaries
//!
//! The [`Translator`] decides what needs translating, chunks the texts,
//! rate-limits and times out each chunk, and writes results back. The
//! wire work is delegated to a [`TranslationBackend`].

pub mod google;
pub mod libre;

pub use google::GoogleTranslateBackend;
pub use libre::LibreTranslateBackend;

use async_trait::async_trait;
use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LookupError, Result};
use crate::language::Language;
use crate::news::{NewsBatch, NewsItem};

/// Default number of texts per backend request
pub const DEFAULT_BATCH_SIZE: usize = 16;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// A machine translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate each text into `target`
    ///
    /// The result has one entry per input; `None` marks a text the backend
    /// could not translate.
    async fn translate_batch(&self, texts: &[String], target: &Language)
    -> Result<Vec<Option<String>>>;
}

/// Which backend the lookup service should build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Public Google Translate web endpoint
    #[default]
    Google,
    /// Self-hosted or public LibreTranslate instance
    Libre,
    /// Translation disabled
    None,
}

impl std::str::FromStr for BackendKind {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "libre" | "libretranslate" => Ok(Self::Libre),
            "none" | "off" | "disabled" => Ok(Self::None),
            other => Err(LookupError::ConfigError(format!(
                "unknown translation backend {other:?}"
            ))),
        }
    }
}

/// Translated batch plus any notices for the user
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOutcome {
    pub batch: NewsBatch,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Headline,
    Summary,
}

/// Translates [`NewsBatch`]es through a [`TranslationBackend`]
pub struct Translator {
    backend: Arc<dyn TranslationBackend>,
    batch_size: usize,
    timeout: Duration,
    rate_limiter: SharedRateLimiter,
}

impl Translator {
    /// `rate_limit` is chunk requests per minute
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        batch_size: usize,
        timeout: Duration,
        rate_limit: u32,
    ) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        Self {
            backend,
            batch_size: batch_size.max(1),
            timeout,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Translate every item that is not already in `target`
    ///
    /// Original text is never modified. Items already translated into
    /// `target` are left alone, so translating twice is a no-op. When every
    /// request fails the batch comes back untranslated with a notice.
    pub async fn translate(&self, batch: NewsBatch, target: &Language) -> TranslationOutcome {
        let mut items = batch.into_items();

        let mut jobs: Vec<(usize, Field)> = Vec::new();
        let mut texts: Vec<String> = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            if !needs_translation(item, target) {
                continue;
            }
            jobs.push((idx, Field::Headline));
            texts.push(item.headline.clone());
            if !item.summary.is_empty() {
                jobs.push((idx, Field::Summary));
                texts.push(item.summary.clone());
            }
        }

        if texts.is_empty() {
            return TranslationOutcome {
                batch: NewsBatch::from_items(items),
                notices: Vec::new(),
            };
        }

        let chunks: Vec<&[String]> = texts.chunks(self.batch_size).collect();
        let chunk_count = chunks.len();
        let results = join_all(chunks.into_iter().map(|chunk| self.translate_chunk(chunk, target))).await;

        let failed = results.iter().filter(|r| r.is_none()).count();
        let translated = results
            .into_iter()
            .zip(texts.chunks(self.batch_size))
            .flat_map(|(result, chunk)| result.unwrap_or_else(|| vec![None; chunk.len()]));

        for ((idx, field), text) in jobs.into_iter().zip(translated) {
            let Some(text) = text else { continue };
            let item = &mut items[idx];
            match field {
                Field::Headline => item.translated_headline = Some(text),
                Field::Summary => item.translated_summary = Some(text),
            }
            item.translated_language = Some(target.clone());
        }

        let mut notices = Vec::new();
        if failed == chunk_count {
            tracing::warn!(
                backend = self.backend.name(),
                chunks = chunk_count,
                "translation backend unavailable, showing original text"
            );
            notices.push(format!(
                "Translation service ({}) unavailable; news shown in original language",
                self.backend.name()
            ));
        } else if failed > 0 {
            tracing::debug!(failed, chunks = chunk_count, "some translation chunks failed");
        }

        TranslationOutcome {
            batch: NewsBatch::from_items(items),
            notices,
        }
    }

    /// `None` when the whole chunk failed
    async fn translate_chunk(&self, chunk: &[String], target: &Language) -> Option<Vec<Option<String>>> {
        // The rate-limit wait counts against the chunk timeout
        let call = async {
            self.rate_limiter.until_ready().await;
            self.backend.translate_batch(chunk, target).await
        };
        let outcome = tokio::time::timeout(self.timeout, call).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(LookupError::timeout(self.backend.name(), self.timeout)),
        };

        match result {
            Ok(translated) if translated.len() == chunk.len() => Some(
                translated
                    .into_iter()
                    .map(|t| t.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
                    .collect(),
            ),
            Ok(translated) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    expected = chunk.len(),
                    got = translated.len(),
                    "translation result size mismatch"
                );
                None
            }
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "translation chunk failed");
                None
            }
        }
    }
}

fn needs_translation(item: &NewsItem, target: &Language) -> bool {
    if item.translated_language.as_ref() == Some(target) {
        return false;
    }
    match &item.original_language {
        Some(lang) => lang != target,
        // Nothing recognisable as language
        None => false,
    }
}
