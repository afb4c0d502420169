//! Prompt context formatting.
//!
//! Serializes one analysis context into the compact natural-language block
//! handed to the reasoning model. Pure and deterministic: identical input
//! always yields byte-identical output, which mock mode and the tests rely on.

use crate::config::ContextConfig;
use crate::types::AnalysisContext;

/// Marker line emitted when the news list is empty.
pub const NO_NEWS_MARKER: &str = "- No recent news available.";

/// Truncate a headline to `max_chars`, appending an ellipsis when cut.
fn truncate_headline(headline: &str, max_chars: usize) -> String {
    if headline.chars().count() <= max_chars {
        return headline.to_string();
    }
    let cut: String = headline.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Format market data and news into the prompt body.
///
/// Never fails: an empty news list degrades to an explicit no-news marker.
pub fn format_context(ctx: &AnalysisContext, limits: &ContextConfig) -> String {
    let market = &ctx.market;

    let mut out = String::new();
    out.push_str("## Market Analysis Request\n\n");
    out.push_str("### Technicals\n");
    out.push_str(&format!("Ticker: {}\n", market.ticker));
    out.push_str(&format!("Current Price: ${:.2}\n", market.current_price));
    out.push_str(&format!("Trend vs EMA(50): {}\n", market.trend));
    out.push_str(&format!(
        "Relative Strength Index (RSI 14): {:.2}\n",
        market.rsi_14
    ));
    out.push_str(&format!("50-Period EMA: {:.2}\n", market.ema_50));

    out.push_str("\n### Sentiment\nRecent Headlines:\n");
    if ctx.news.is_empty() {
        out.push_str(NO_NEWS_MARKER);
        out.push('\n');
    } else {
        for item in ctx.news.iter().take(limits.news_limit) {
            let headline = truncate_headline(&item.headline, limits.headline_max_chars);
            if item.source.is_empty() {
                out.push_str(&format!("- {headline}\n"));
            } else {
                out.push_str(&format!("- {headline} ({})\n", item.source));
            }
        }
    }

    out
}
