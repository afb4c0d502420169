//! Technical indicator calculations over OHLC candle series.

pub mod ema;
pub mod rsi;

pub use ema::Ema;
pub use rsi::Rsi;
