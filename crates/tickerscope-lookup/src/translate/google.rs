//! Google Translate public web endpoint (`client=gtx`)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::TranslationBackend;
use crate::error::{LookupError, Result};
use crate::language::Language;

const ENDPOINT: &str = "https://translate.googleapis.com/translate_a/t";

/// Keyless Google Translate backend
///
/// Sends every text of a chunk as a repeated `q` parameter.
#[derive(Debug, Clone)]
pub struct GoogleTranslateBackend {
    http: Client,
    endpoint: String,
}

impl Default for GoogleTranslateBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleTranslateBackend {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
            endpoint: ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateBackend {
    fn name(&self) -> &'static str {
        "google-translate"
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        target: &Language,
    ) -> Result<Vec<Option<String>>> {
        let mut params: Vec<(&str, &str)> = vec![
            ("client", "gtx"),
            ("sl", "auto"),
            ("tl", target.translation_code()),
            ("format", "text"),
        ];
        params.extend(texts.iter().map(|t| ("q", t.as_str())));

        // POST keeps long batches out of the URL
        let response = self.http.post(&self.endpoint).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(LookupError::TranslationError(format!(
                "Google Translate returned {status}"
            )));
        }

        let body: Value = response.json().await?;
        parse_response(&body, texts.len())
    }
}

/// Decode the endpoint's loosely shaped answer
///
/// One text with a fixed source language comes back as a bare string; one
/// text with `sl=auto` as `[translation, detected]`; several texts as an
/// array with one such entry per text.
fn parse_response(body: &Value, expected: usize) -> Result<Vec<Option<String>>> {
    let entry = |v: &Value| -> Option<String> {
        match v {
            Value::String(s) => Some(s.clone()),
            Value::Array(parts) => parts.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    };

    match body {
        Value::String(s) if expected == 1 => Ok(vec![Some(s.clone())]),
        Value::Array(entries) if expected == 1 && entries.first().is_some_and(Value::is_string) => {
            Ok(vec![entry(body)])
        }
        Value::Array(entries) if entries.len() == expected => Ok(entries.iter().map(entry).collect()),
        _ => Err(LookupError::TranslationError(format!(
            "unexpected Google Translate response shape for {expected} texts"
        ))),
    }
}
