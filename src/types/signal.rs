use crate::error::{AgentError, Result};
use crate::types::{MarketRecord, NewsItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trading action recommended by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl FromStr for SignalAction {
    type Err = AgentError;

    /// Case-insensitive parse. Unrecognized tokens are an error; the action
    /// is never defaulted, so model garbage cannot masquerade as a decision.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(SignalAction::Buy),
            "sell" => Ok(SignalAction::Sell),
            "hold" => Ok(SignalAction::Hold),
            other => Err(AgentError::MalformedSignal(format!(
                "unrecognized action token '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "Buy"),
            SignalAction::Sell => write!(f, "Sell"),
            SignalAction::Hold => write!(f, "Hold"),
        }
    }
}

/// The final, validated output of one analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub ticker: String,
    pub action: SignalAction,
    /// Confidence in [0, 1]; out-of-range model output is clamped upstream.
    pub confidence: f64,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    pub generated_at: DateTime<Utc>,
}

impl TradeSignal {
    /// Construct a validated signal.
    ///
    /// Confidence is clamped to [0, 1]; empty reasoning is rejected here as a
    /// last line of defense (the parser rejects it earlier with context).
    pub fn new(
        ticker: &str,
        action: SignalAction,
        confidence: f64,
        reasoning: &str,
        stop_loss: Option<f64>,
    ) -> Result<Self> {
        let reasoning = reasoning.trim();
        if reasoning.is_empty() {
            return Err(AgentError::MalformedSignal(
                "empty reasoning text".to_string(),
            ));
        }
        Ok(Self {
            ticker: ticker.to_uppercase(),
            action,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.to_string(),
            stop_loss,
            generated_at: Utc::now(),
        })
    }
}

/// Inputs for a single analysis call, owned by the engine for its duration.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub market: MarketRecord,
    /// Most-recent-first.
    pub news: Vec<NewsItem>,
}

/// Everything the presentation layer needs to render one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub signal: TradeSignal,
    pub market: MarketRecord,
    pub news: Vec<NewsItem>,
}
