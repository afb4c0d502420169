//! Exponential Moving Average (EMA) indicator.

use crate::types::OhlcPoint;

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices.
pub struct Ema {
    period: usize,
}

impl Default for Ema {
    fn default() -> Self {
        Self { period: 50 }
    }
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Minimum number of candle periods required for calculation.
    pub fn min_periods(&self) -> usize {
        self.period
    }

    /// Calculate the EMA over the candle series.
    /// Returns None if there is insufficient data.
    pub fn calculate(&self, candles: &[OhlcPoint]) -> Option<f64> {
        let period = self.period;
        if candles.len() < period {
            return None;
        }

        let multiplier = 2.0 / (period as f64 + 1.0);

        // First EMA is SMA
        let sma: f64 = candles.iter().take(period).map(|c| c.close).sum::<f64>() / period as f64;

        let mut ema = sma;
        for candle in candles.iter().skip(period) {
            ema = (candle.close - ema) * multiplier + ema;
        }

        Some(ema)
    }
}
