//! LibreTranslate backend

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TranslationBackend;
use crate::error::{LookupError, Result};
use crate::language::Language;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a [String],
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: TranslatedText,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranslatedText {
    Many(Vec<Option<String>>),
    One(String),
}

/// Client for a LibreTranslate server's `/translate` route
#[derive(Debug, Clone)]
pub struct LibreTranslateBackend {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl LibreTranslateBackend {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateBackend {
    fn name(&self) -> &'static str {
        "libretranslate"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target: &Language,
    ) -> Result<Vec<Option<String>>> {
        let request = TranslateRequest {
            q: texts,
            source: "auto",
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::TranslationError(format!(
                "LibreTranslate returned {status}: {body}"
            )));
        }

        let parsed: TranslateResponse = response.json().await?;
        Ok(match parsed.translated_text {
            TranslatedText::Many(items) => items,
            TranslatedText::One(text) => vec![Some(text)],
        })
    }
}
