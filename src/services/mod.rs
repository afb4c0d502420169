pub mod alerts;
pub mod context;
pub mod engine;
pub mod indicators;
pub mod parser;
pub mod reasoning;
pub mod retry;

pub use alerts::TelegramNotifier;
pub use context::format_context;
pub use engine::AnalysisEngine;
pub use indicators::{Ema, Rsi};
pub use parser::SignalParser;
pub use reasoning::{
    HttpReasoningClient, MockReasoningClient, RawResponse, ReasoningClient, PERSONA,
};
pub use retry::RetryPolicy;
