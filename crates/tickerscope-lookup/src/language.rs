//! Languages and lightweight script-based language detection
//!
//! This module provides a flexible language enum that supports the languages
//! the lookup tool is commonly asked for and allows extension via `Other`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A target or source language
///
/// # Examples
///
/// ```
/// use tickerscope_lookup::Language;
///
/// let lang = Language::Chinese;
/// assert_eq!(lang.code(), "zh");
/// assert_eq!(lang.name(), "Chinese");
///
/// // Parse from string
/// let parsed = Language::from_code("en");
/// assert_eq!(parsed, Language::English);
///
/// // Custom language
/// let custom = Language::Other("ja".to_string());
/// assert_eq!(custom.code(), "ja");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    /// English
    #[default]
    English,
    /// Chinese (Simplified)
    Chinese,
    /// Other languages (ISO 639-1 code)
    Other(String),
}

impl Language {
    /// Get ISO 639-1 language code
    pub fn code(&self) -> &str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
            Language::Other(code) => code,
        }
    }

    /// Get language name for display
    pub fn name(&self) -> &str {
        match self {
            Language::English => "English",
            Language::Chinese => "Chinese",
            Language::Other(code) => code,
        }
    }

    /// Code accepted by translation services that distinguish Chinese scripts
    pub fn translation_code(&self) -> &str {
        match self {
            Language::Chinese => "zh-CN",
            other => other.code(),
        }
    }

    /// Parse from ISO 639-1 code or common name
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerscope_lookup::Language;
    ///
    /// assert_eq!(Language::from_code("en"), Language::English);
    /// assert_eq!(Language::from_code("zh-CN"), Language::Chinese);
    /// assert_eq!(Language::from_code("中文"), Language::Chinese);
    /// assert_eq!(Language::from_code("ja"), Language::Other("ja".to_string()));
    /// ```
    pub fn from_code(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" | "en-us" | "en-gb" => Language::English,
            "zh" | "chinese" | "中文" | "zh-cn" | "zh-hans" => Language::Chinese,
            other => Language::Other(other.to_string()),
        }
    }

    /// Check if this is a known language (not Other)
    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Other(_))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&str> for Language {
    fn from(s: &str) -> Self {
        Language::from_code(s)
    }
}

impl From<String> for Language {
    fn from(s: String) -> Self {
        Language::from_code(&s)
    }
}

#[derive(Debug, Default)]
struct ScriptCounts {
    han: usize,
    kana: usize,
    hangul: usize,
    cyrillic: usize,
    arabic: usize,
    latin: usize,
}

/// Guess the language of a short text from the scripts it is written in
///
/// Headlines are short, so this counts letters per Unicode script and picks
/// the dominant one. Any kana makes the text Japanese, since Japanese mixes
/// kana with Han. Text without letters yields `None`.
///
/// Latin script is always reported as English, so Spanish, French or German
/// headlines come back as English too. With an English target those items
/// are treated as already translated and left as they are.
pub fn detect_language(text: &str) -> Option<Language> {
    let mut counts = ScriptCounts::default();

    for c in text.chars() {
        match c as u32 {
            0x3040..=0x30FF | 0x31F0..=0x31FF => counts.kana += 1,
            0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => counts.han += 1,
            0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => counts.hangul += 1,
            0x0400..=0x04FF => counts.cyrillic += 1,
            0x0600..=0x06FF => counts.arabic += 1,
            _ if c.is_ascii_alphabetic() => counts.latin += 1,
            0x00C0..=0x024F => counts.latin += 1,
            _ => {}
        }
    }

    if counts.kana > 0 {
        return Some(Language::Other("ja".to_string()));
    }

    // A handful of CJK characters carries as much text as a long Latin run.
    let candidates = [
        (counts.han * 3, Language::Chinese),
        (counts.hangul * 3, Language::Other("ko".to_string())),
        (counts.cyrillic, Language::Other("ru".to_string())),
        (counts.arabic, Language::Other("ar".to_string())),
        (counts.latin, Language::English),
    ];

    candidates
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .max_by_key(|(count, _)| *count)
        .map(|(_, lang)| lang)
}
