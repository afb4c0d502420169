//! External data providers: market data and news.
//!
//! Each provider is a capability trait with a network-backed implementation
//! and a deterministic mock, selected at engine construction time.

pub mod yahoo;
pub mod yahoo_news;

pub use yahoo::YahooFinanceClient;
pub use yahoo_news::YahooNewsClient;

use crate::error::Result;
use crate::types::{MarketRecord, NewsItem, OhlcPoint};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

/// Market data capability: one validated record per ticker request.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, ticker: &str) -> Result<MarketRecord>;
}

/// News capability: recent headlines for a query, most-recent-first.
/// An empty list is a valid result, not an error.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<NewsItem>>;
}

/// Canned market data for mock mode. Zero network calls.
pub struct MockMarketData;

impl MockMarketData {
    /// Deterministic synthetic candles: a gentle ramp toward `last_close`.
    fn synthetic_history(last_close: f64, count: usize) -> Vec<OhlcPoint> {
        (0..count)
            .map(|i| {
                // Small deterministic oscillation around a rising base.
                let progress = i as f64 / count as f64;
                let base = last_close * (0.94 + 0.06 * progress);
                let wobble = (i as f64 * 0.7).sin() * last_close * 0.004;
                let close = base + wobble;
                OhlcPoint {
                    time: 1_700_000_000_000 + i as i64 * 3_600_000,
                    open: close - wobble * 0.5,
                    high: close + last_close * 0.003,
                    low: close - last_close * 0.003,
                    close,
                    volume: Some(1_000_000.0),
                }
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch(&self, ticker: &str) -> Result<MarketRecord> {
        MarketRecord::new(
            ticker,
            250.00,
            55.0,
            245.0,
            Self::synthetic_history(250.00, 60),
        )
    }
}

/// Canned headlines for mock mode.
pub struct MockNews;

#[async_trait]
impl NewsProvider for MockNews {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let ticker = query.to_uppercase();
        let items = vec![
            NewsItem::new(
                &format!("{ticker} announces new AI chip, investors are cautiously optimistic."),
                "The company unveiled its next-generation accelerator at its annual event.",
                "Mock News Service",
            )
            .with_published_at(Utc::now() - ChronoDuration::hours(3)),
            NewsItem::new(
                "Analysts debate future growth prospects for the semiconductor industry.",
                "",
                "Fauxancial Times",
            )
            .with_published_at(Utc::now() - ChronoDuration::hours(8)),
        ];
        Ok(items.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Trend;

    #[tokio::test]
    async fn test_mock_market_data_matches_canned_values() {
        let record = MockMarketData.fetch("tsla").await.unwrap();
        assert_eq!(record.ticker, "TSLA");
        assert_eq!(record.current_price, 250.00);
        assert_eq!(record.rsi_14, 55.0);
        assert_eq!(record.ema_50, 245.0);
        assert_eq!(record.trend, Trend::Up);
        assert_eq!(record.history.len(), 60);
    }

    #[tokio::test]
    async fn test_mock_news_respects_limit() {
        let items = MockNews.fetch("TSLA", 1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].headline.contains("TSLA"));
    }

    #[tokio::test]
    async fn test_mock_history_is_deterministic() {
        let a = MockMarketData.fetch("SPY").await.unwrap();
        let b = MockMarketData.fetch("SPY").await.unwrap();
        assert_eq!(a.closes(), b.closes());
    }
}
