//! One-shot terminal report for a single-ticker analysis.
//!
//! Renders an [`AnalysisReport`] as plain text: header, technicals, a price
//! sparkline, recent headlines and the signal block.

use crate::types::AnalysisReport;

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn normalize_value(value: f64, minimum: f64, maximum: f64) -> usize {
    if maximum == minimum {
        return SPARK_CHARS.len() / 2;
    }
    let ratio = ((value - minimum) / (maximum - minimum)).clamp(0.0, 1.0);
    (ratio * (SPARK_CHARS.len() - 1) as f64).round() as usize
}

fn build_series_line(series: &[f64], minimum: f64, maximum: f64) -> String {
    series
        .iter()
        .map(|&v| SPARK_CHARS[normalize_value(v, minimum, maximum)])
        .collect()
}

/// Render a sparkline of the most recent closes, newest at the right.
///
/// Returns an empty string when there is no history to draw.
pub fn render_price_chart(closes: &[f64], lookback: usize) -> String {
    if closes.is_empty() {
        return String::new();
    }

    let tail: Vec<f64> = closes
        .iter()
        .copied()
        .skip(closes.len().saturating_sub(lookback))
        .collect();

    let minimum = tail.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum = tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut line = build_series_line(&tail, minimum, maximum);
    if line.chars().count() > 1 {
        line.pop();
        line.push('●');
    }
    line
}

/// Format the full report block printed by `augur analyze`.
pub fn render_report(report: &AnalysisReport) -> String {
    let market = &report.market;
    let signal = &report.signal;

    let mut out = String::new();
    out.push_str(&format!(
        "{} | Price: ${:.2} | Trend: {}\n",
        market.ticker, market.current_price, market.trend
    ));
    out.push_str(&"─".repeat(60));
    out.push('\n');

    out.push_str("Technicals\n");
    out.push_str(&format!("  RSI (14): {:.2}\n", market.rsi_14));
    out.push_str(&format!("  EMA (50): ${:.2}\n", market.ema_50));

    let chart = render_price_chart(&market.closes(), 30);
    if !chart.is_empty() {
        out.push_str("  Price history\n");
        out.push_str(&format!("  {chart}\n"));
    }

    out.push_str("\nRecent News\n");
    if report.news.is_empty() {
        out.push_str("  No recent news available.\n");
    } else {
        for item in &report.news {
            if item.source.is_empty() {
                out.push_str(&format!("  - {}\n", item.headline));
            } else {
                out.push_str(&format!("  - {} ({})\n", item.headline, item.source));
            }
        }
    }

    out.push_str("\nSignal\n");
    out.push_str(&format!("  Action:     {}\n", signal.action));
    out.push_str(&format!("  Confidence: {:.0}%\n", signal.confidence * 100.0));
    if let Some(stop_loss) = signal.stop_loss {
        out.push_str(&format!("  Stop Loss:  ${stop_loss:.2}\n"));
    }
    out.push_str(&format!("  Reasoning:  {}\n", signal.reasoning));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketRecord, NewsItem, OhlcPoint, SignalAction, TradeSignal};

    fn candles(closes: &[f64]) -> Vec<OhlcPoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcPoint {
                time: i as i64,
                open: close,
                high: close,
                low: close,
                close,
                volume: None,
            })
            .collect()
    }

    fn sample_report(news: Vec<NewsItem>) -> AnalysisReport {
        AnalysisReport {
            signal: TradeSignal::new(
                "TSLA",
                SignalAction::Hold,
                0.65,
                "Consolidating near the EMA.",
                Some(240.0),
            )
            .unwrap(),
            market: MarketRecord::new(
                "TSLA",
                250.0,
                55.0,
                245.0,
                candles(&[240.0, 244.0, 248.0, 250.0]),
            )
            .unwrap(),
            news,
        }
    }

    #[test]
    fn test_sparkline_flat_series() {
        let chart = render_price_chart(&[5.0, 5.0, 5.0], 30);
        assert_eq!(chart.chars().count(), 3);
        assert!(chart.ends_with('●'));
    }

    #[test]
    fn test_sparkline_varying_series_spans_range() {
        let chart = render_price_chart(&[1.0, 2.0, 3.0, 4.0, 5.0], 30);
        assert!(chart.starts_with('▁'));
        assert!(chart.ends_with('●'));
    }

    #[test]
    fn test_sparkline_empty_series() {
        assert!(render_price_chart(&[], 30).is_empty());
    }

    #[test]
    fn test_sparkline_respects_lookback() {
        let closes: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let chart = render_price_chart(&closes, 30);
        assert_eq!(chart.chars().count(), 30);
    }

    #[test]
    fn test_report_contains_all_sections() {
        let report = sample_report(vec![NewsItem::new("Deliveries beat estimates", "", "Wire")]);
        let text = render_report(&report);
        assert!(text.contains("TSLA | Price: $250.00 | Trend: Up"));
        assert!(text.contains("RSI (14): 55.00"));
        assert!(text.contains("EMA (50): $245.00"));
        assert!(text.contains("Deliveries beat estimates (Wire)"));
        assert!(text.contains("Action:     Hold"));
        assert!(text.contains("Confidence: 65%"));
        assert!(text.contains("Stop Loss:  $240.00"));
    }

    #[test]
    fn test_report_no_news_marker() {
        let text = render_report(&sample_report(vec![]));
        assert!(text.contains("No recent news available."));
    }
}
