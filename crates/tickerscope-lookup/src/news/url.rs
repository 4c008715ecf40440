//! Article URL normalization for deduplication

use url::Url;

/// Query keys that identify an article rather than track the click
const ARTICLE_ID_KEYS: &[&str] = &[
    "id",
    "article_id",
    "articleid",
    "story_id",
    "storyid",
    "guid",
    "p",
    "aid",
    "newsid",
];

/// Canonical form of an article URL, or `None` if it is not an absolute
/// http(s) URL
///
/// Scheme and host are lower-cased, a leading `www.` and default ports are
/// dropped, the fragment and trailing slash are removed, and only query
/// parameters that carry an article id survive (sorted, so parameter order
/// does not matter). `http` and `https` map to the same key.
///
/// ```
/// use tickerscope_lookup::news::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://www.Example.com/story/?utm_source=x#top").as_deref(),
///     Some("example.com/story")
/// );
/// ```
pub fn normalize_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let mut key = host.to_string();
    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{port}"));
    }

    let path = parsed.path().trim_end_matches('/');
    key.push_str(path);

    let mut ids: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| ARTICLE_ID_KEYS.contains(&k.to_ascii_lowercase().as_str()))
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();

    if !ids.is_empty() {
        ids.sort();
        let query = ids
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        key.push('?');
        key.push_str(&query);
    }

    Some(key)
}
