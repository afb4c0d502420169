use crate::error::{AgentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// OHLC (Open, High, Low, Close) data point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Price trend relative to the 50-period EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Derive the trend from current price vs. EMA.
    ///
    /// Prices within 0.1% of the EMA count as Flat so that noise around the
    /// average does not flip the label on every refresh.
    pub fn from_price_vs_ema(price: f64, ema: f64) -> Self {
        if ema <= 0.0 {
            return Trend::Flat;
        }
        let deviation = (price - ema) / ema;
        if deviation > 0.001 {
            Trend::Up
        } else if deviation < -0.001 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => write!(f, "Up"),
            Trend::Down => write!(f, "Down"),
            Trend::Flat => write!(f, "Flat"),
        }
    }
}

/// A validated snapshot of market data for one ticker.
///
/// Immutable once constructed; fetched fresh for every analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRecord {
    pub ticker: String,
    pub current_price: f64,
    pub rsi_14: f64,
    pub ema_50: f64,
    pub trend: Trend,
    pub fetched_at: DateTime<Utc>,
    /// Recent candles, oldest first. Used for the report sparkline.
    pub history: Vec<OhlcPoint>,
}

impl MarketRecord {
    /// Construct a validated record. The ticker is uppercased.
    pub fn new(
        ticker: &str,
        current_price: f64,
        rsi_14: f64,
        ema_50: f64,
        history: Vec<OhlcPoint>,
    ) -> Result<Self> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(AgentError::DataUnavailable {
                ticker: String::new(),
                reason: "empty ticker symbol".to_string(),
            });
        }
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(AgentError::DataUnavailable {
                ticker,
                reason: format!("non-positive price {current_price}"),
            });
        }
        Ok(Self {
            ticker,
            current_price,
            rsi_14,
            ema_50,
            trend: Trend::from_price_vs_ema(current_price, ema_50),
            fetched_at: Utc::now(),
            history,
        })
    }

    /// Closing prices of the recent history, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.history.iter().map(|p| p.close).collect()
    }
}
