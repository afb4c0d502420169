//! Signal parsing and validation.
//!
//! Maps the model's free-form completion text onto a [`TradeSignal`] in two
//! stages: a strict JSON extraction, then a bounded regex heuristic. Malformed
//! output is a final failure for the call; re-asking the model is the
//! engine's job, never the parser's.

use crate::error::{AgentError, Result};
use crate::services::reasoning::RawResponse;
use crate::types::{SignalAction, TradeSignal};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

/// Structured fragment the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct SignalWire {
    #[serde(alias = "action")]
    signal: Option<String>,
    confidence: Option<serde_json::Value>,
    reasoning: Option<String>,
    #[serde(default)]
    stop_loss: Option<f64>,
}

/// Two-stage extractor from raw completion text to a validated signal.
pub struct SignalParser {
    action_re: Regex,
    confidence_re: Regex,
    reasoning_max_chars: usize,
}

impl SignalParser {
    pub fn new(reasoning_max_chars: usize) -> Self {
        Self {
            action_re: Regex::new(r"(?i)\b(buy|sell|hold)\b").expect("valid action regex"),
            confidence_re: Regex::new(r"(?i)confidence[^0-9]{0,12}([0-9]*\.?[0-9]+)\s*(%?)")
                .expect("valid confidence regex"),
            reasoning_max_chars,
        }
    }

    /// Parse a raw completion into a validated signal for `ticker`.
    ///
    /// The heuristic stage runs only when no decodable JSON fragment exists.
    /// A fragment that decodes but fails validation (unknown action, missing
    /// confidence, blank reasoning) is a final failure: falling through to a
    /// keyword scan there could re-admit exactly the output the validation
    /// rejected.
    pub fn parse(&self, ticker: &str, raw: &RawResponse) -> Result<TradeSignal> {
        let text = raw.text.trim();
        if text.is_empty() {
            return Err(AgentError::MalformedSignal(
                "empty completion text".to_string(),
            ));
        }

        let wire = match extract_json_fragment(text) {
            Some(fragment) => match serde_json::from_str::<SignalWire>(&fragment) {
                Ok(wire) => Some(wire),
                Err(e) => {
                    warn!(error = %e, "undecodable JSON fragment, trying heuristic");
                    None
                }
            },
            None => None,
        };

        match wire {
            Some(wire) => self.validate_wire(ticker, wire),
            None => self.parse_heuristic(ticker, text),
        }
    }

    /// Stage 1 validation of a decoded fragment.
    fn validate_wire(&self, ticker: &str, wire: SignalWire) -> Result<TradeSignal> {
        let action_token = wire.signal.ok_or_else(|| {
            AgentError::MalformedSignal("missing 'signal' field".to_string())
        })?;
        let action: SignalAction = action_token.parse()?;

        let confidence = wire
            .confidence
            .as_ref()
            .and_then(decode_confidence)
            .ok_or_else(|| {
                AgentError::MalformedSignal("missing or non-numeric 'confidence'".to_string())
            })?;

        let reasoning = wire.reasoning.unwrap_or_default();

        self.build(ticker, action, confidence, &reasoning, wire.stop_loss)
    }

    /// Stage 2: keyword + confidence extraction from unstructured text.
    fn parse_heuristic(&self, ticker: &str, text: &str) -> Result<TradeSignal> {
        let action: SignalAction = self
            .action_re
            .find(text)
            .ok_or_else(|| {
                AgentError::MalformedSignal("no action keyword in response".to_string())
            })?
            .as_str()
            .parse()?;

        let caps = self.confidence_re.captures(text).ok_or_else(|| {
            AgentError::MalformedSignal("no confidence value in response".to_string())
        })?;
        let mut confidence: f64 = caps[1]
            .parse()
            .map_err(|_| AgentError::MalformedSignal("unparseable confidence".to_string()))?;
        if &caps[2] == "%" {
            confidence /= 100.0;
        }

        self.build(ticker, action, confidence, text, None)
    }

    /// Shared validation: clamp confidence, bound reasoning, reject blanks.
    fn build(
        &self,
        ticker: &str,
        action: SignalAction,
        confidence: f64,
        reasoning: &str,
        stop_loss: Option<f64>,
    ) -> Result<TradeSignal> {
        if !(0.0..=1.0).contains(&confidence) {
            warn!(confidence, "confidence outside [0, 1], clamping");
        }

        let reasoning = reasoning.trim();
        if reasoning.is_empty() {
            return Err(AgentError::MalformedSignal(
                "empty reasoning text".to_string(),
            ));
        }

        let bounded: String = if reasoning.chars().count() > self.reasoning_max_chars {
            warn!(
                max = self.reasoning_max_chars,
                "reasoning text over bound, truncating"
            );
            reasoning.chars().take(self.reasoning_max_chars).collect()
        } else {
            reasoning.to_string()
        };

        TradeSignal::new(ticker, action, confidence.clamp(0.0, 1.0), &bounded, stop_loss)
    }
}

/// Strip markdown fences and slice the first `{` to the last `}`.
fn extract_json_fragment(text: &str) -> Option<String> {
    let cleaned = text
        .replace("```json", "")
        .replace("```", "");
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(cleaned[start..=end].to_string())
}

/// Accept a JSON number or a numeric string for confidence.
fn decode_confidence(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}
