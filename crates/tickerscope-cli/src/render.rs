//! Terminal rendering of lookup results

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use tickerscope_lookup::{LookupResult, QuoteSection};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Render a result as tables for a terminal
pub fn render_text(result: &LookupResult) -> String {
    let mut out = format!(
        "{}  ·  {}  ·  {}\n",
        result.ticker,
        result.phase,
        result.generated_at.format(TIME_FORMAT)
    );

    match &result.quote {
        QuoteSection::Available(quote) => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["Price", "Change", "Currency", "As of", "Source"]);
            table.add_row(vec![
                quote.display_price(),
                quote.display_change(),
                quote.currency.clone(),
                format!(
                    "{}{}",
                    quote.as_of.format(TIME_FORMAT),
                    if quote.stale { " (stale)" } else { "" }
                ),
                quote.source.clone(),
            ]);
            out.push_str(&table.to_string());
            out.push('\n');
            for warning in &quote.warnings {
                out.push_str(&format!("  ! {warning}\n"));
            }
        }
        QuoteSection::Unavailable { reason } => {
            out.push_str(&format!("Quote unavailable: {reason}\n"));
        }
    }

    if result.news.is_empty() {
        out.push_str("No news in the selected window.\n");
    } else {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Published", "Source", "Headline"]);
        for item in &result.news {
            let headline = match &item.translated_headline {
                Some(translated) => format!("{translated}\n{}\n{}", item.headline, item.url),
                None => format!("{}\n{}", item.headline, item.url),
            };
            table.add_row(vec![
                item.published_at.format(TIME_FORMAT).to_string(),
                item.source_name.clone(),
                headline,
            ]);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    for notice in &result.notices {
        out.push_str(&format!("Note: {notice}\n"));
    }
    out
}

/// Render a result as pretty JSON
pub fn render_json(result: &LookupResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}
