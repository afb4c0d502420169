//! Yahoo Finance API client for market data.
//!
//! Fetches recent hourly OHLC history from the unofficial Yahoo Finance chart
//! API and derives the indicators the analysis needs (RSI-14, EMA-50).

use crate::error::{AgentError, Result};
use crate::services::indicators::{Ema, Rsi};
use crate::sources::MarketDataProvider;
use crate::types::{MarketRecord, OhlcPoint};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

/// Yahoo Finance market data client.
pub struct YahooFinanceClient {
    client: Client,
    rsi: Rsi,
    ema: Ema,
}

impl YahooFinanceClient {
    /// Create a new client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            rsi: Rsi::default(),
            ema: Ema::default(),
        })
    }

    /// Fetch 5 days of hourly candles for a symbol.
    async fn get_history(&self, ticker: &str) -> Result<Vec<OhlcPoint>> {
        let symbol = normalize_yahoo_symbol(ticker);
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}?range=5d&interval=1h&includePrePost=false"
        );

        debug!(%symbol, "fetching Yahoo Finance history");

        let unavailable = |reason: String| AgentError::DataUnavailable {
            ticker: symbol.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("API error: {}", response.status())));
        }

        let data: YahooChartResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("parse error: {e}")))?;

        if let Some(error) = data.chart.error {
            return Err(unavailable(format!(
                "Yahoo API error: {} - {}",
                error.code, error.description
            )));
        }

        let result = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| unavailable("no results in response".to_string()))?;

        let timestamps = result
            .timestamp
            .ok_or_else(|| unavailable("no timestamps in response".to_string()))?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| unavailable("no quote data in response".to_string()))?;

        let opens = quote.open.unwrap_or_default();
        let highs = quote.high.unwrap_or_default();
        let lows = quote.low.unwrap_or_default();
        let closes = quote.close.unwrap_or_default();
        let volumes = quote.volume.unwrap_or_default();

        let mut points = Vec::new();
        for (i, &timestamp) in timestamps.iter().enumerate() {
            let open = opens.get(i).and_then(|v| *v).unwrap_or(0.0);
            let high = highs.get(i).and_then(|v| *v).unwrap_or(0.0);
            let low = lows.get(i).and_then(|v| *v).unwrap_or(0.0);
            let close = closes.get(i).and_then(|v| *v).unwrap_or(0.0);
            let volume = volumes.get(i).and_then(|v| *v).map(|v| v as f64);

            // Skip invalid data points
            if close <= 0.0 {
                continue;
            }

            points.push(OhlcPoint {
                time: timestamp * 1000,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if points.is_empty() {
            return Err(unavailable("empty candle history".to_string()));
        }

        Ok(points)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch(&self, ticker: &str) -> Result<MarketRecord> {
        let history = self.get_history(ticker).await?;

        let rsi_14 = self.rsi.calculate(&history).ok_or_else(|| {
            AgentError::DataUnavailable {
                ticker: ticker.to_uppercase(),
                reason: format!(
                    "not enough candles for RSI ({} < {})",
                    history.len(),
                    self.rsi.min_periods()
                ),
            }
        })?;

        let ema_50 = self.ema.calculate(&history).ok_or_else(|| {
            AgentError::DataUnavailable {
                ticker: ticker.to_uppercase(),
                reason: format!(
                    "not enough candles for EMA ({} < {})",
                    history.len(),
                    self.ema.min_periods()
                ),
            }
        })?;

        let current_price = history.last().map(|p| p.close).unwrap_or_default();

        MarketRecord::new(ticker, current_price, rsi_14, ema_50, history)
    }
}
