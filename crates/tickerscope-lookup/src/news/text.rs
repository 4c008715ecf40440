//! Headline and summary cleanup

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid CDATA pattern"));
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^<>]*>").expect("valid markup pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Strip markup, decode entities and collapse whitespace
///
/// Feeds frequently double-escape their HTML (`&lt;b&gt;`). When the first
/// pass leaves text that still looks like tags, it is parsed once more; a
/// bare `<` or `>` in prose survives both passes.
pub fn clean_text(raw: &str) -> String {
    let unwrapped = CDATA.replace_all(raw, "$1");
    let mut text = fragment_text(&unwrapped);
    if MARKUP.is_match(&text) {
        text = fragment_text(&text);
    }
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Text content of an HTML fragment, one space between text nodes
fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup() {
        assert_eq!(
            clean_text("<p>Apple <b>beats</b>\n  estimates</p>"),
            "Apple beats estimates"
        );
    }

    #[test]
    fn test_clean_text_double_escaped() {
        assert_eq!(
            clean_text("&lt;a href=&quot;x&quot;&gt;Nvidia &amp; AMD&lt;/a&gt;"),
            "Nvidia & AMD"
        );
    }

    #[test]
    fn test_clean_text_keeps_comparison_signs() {
        assert_eq!(
            clean_text("S&amp;P 500 &lt; 5000 as yields &gt; 4%"),
            "S&P 500 < 5000 as yields > 4%"
        );
    }

    #[test]
    fn test_clean_text_cdata() {
        assert_eq!(clean_text("<![CDATA[Tesla <i>rallies</i>]]>"), "Tesla rallies");
    }

    #[test]
    fn test_clean_text_numeric_entities() {
        assert_eq!(clean_text("It&#39;s &#x201C;up&#x201D;"), "It's “up”");
        assert_eq!(clean_text("Dow&nbsp;&nbsp;gains"), "Dow gains");
    }
}
