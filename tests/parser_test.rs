//! Parser/validator property tests over the public API.

use augur::services::{RawResponse, SignalParser};
use augur::types::SignalAction;
use augur::AgentError;

fn parse(text: &str) -> Result<augur::TradeSignal, AgentError> {
    SignalParser::new(480).parse("TSLA", &RawResponse::from_text(text))
}

#[test]
fn well_formed_fragments_round_trip_for_every_action() {
    for (token, expected) in [
        ("Buy", SignalAction::Buy),
        ("SELL", SignalAction::Sell),
        ("hold", SignalAction::Hold),
    ] {
        let text = format!(
            r#"{{"signal": "{token}", "confidence": 0.42, "reasoning": "Deterministic test case."}}"#
        );
        let signal = parse(&text).unwrap();
        assert_eq!(signal.action, expected);
        assert_eq!(signal.confidence, 0.42);
        assert_eq!(signal.reasoning, "Deterministic test case.");
        assert_eq!(signal.ticker, "TSLA");
    }
}

#[test]
fn in_range_confidences_are_preserved_exactly() {
    for confidence in [0.0, 0.25, 0.5, 0.99, 1.0] {
        let text = format!(
            r#"{{"signal": "Hold", "confidence": {confidence}, "reasoning": "Range check."}}"#
        );
        let signal = parse(&text).unwrap();
        assert_eq!(signal.confidence, confidence);
    }
}

#[test]
fn out_of_range_confidences_are_clamped_not_rejected() {
    for (given, expected) in [(1.5, 1.0), (7.0, 1.0), (-0.1, 0.0), (-42.0, 0.0)] {
        let text = format!(
            r#"{{"signal": "Hold", "confidence": {given}, "reasoning": "Clamp check."}}"#
        );
        let signal = parse(&text).unwrap();
        assert_eq!(signal.confidence, expected, "for input {given}");
    }
}

#[test]
fn unrecognized_actions_never_default_to_hold() {
    for token in ["Short", "Long", "Accumulate", "BUY NOW", ""] {
        let text = format!(
            r#"{{"signal": "{token}", "confidence": 0.8, "reasoning": "Should fail."}}"#
        );
        let err = parse(&text).unwrap_err();
        assert!(
            matches!(err, AgentError::MalformedSignal(_)),
            "token {token:?} should be malformed"
        );
    }
}

#[test]
fn refusals_are_malformed_not_hold() {
    for refusal in [
        "I cannot provide financial advice.",
        "As a language model, I must decline to answer.",
        "",
    ] {
        let err = parse(refusal).unwrap_err();
        assert!(matches!(err, AgentError::MalformedSignal(_)));
    }
}

#[test]
fn fenced_and_prose_wrapped_json_is_accepted() {
    let fenced = "```json\n{\"signal\": \"Buy\", \"confidence\": 0.8, \"reasoning\": \"ok\"}\n```";
    assert_eq!(parse(fenced).unwrap().action, SignalAction::Buy);

    let prose = "Sure, here's the analysis you asked for:\n\n{\"signal\": \"Sell\", \"confidence\": 0.6, \"reasoning\": \"fading strength\"}\n\nStay safe out there.";
    assert_eq!(parse(prose).unwrap().action, SignalAction::Sell);
}

#[test]
fn heuristic_fallback_handles_unstructured_completions() {
    let text = "Given the overbought RSI I would Sell. Confidence 0.65, mostly on the divergence.";
    let signal = parse(text).unwrap();
    assert_eq!(signal.action, SignalAction::Sell);
    assert_eq!(signal.confidence, 0.65);
    assert!(signal.reasoning.contains("divergence"));
}

#[test]
fn reasoning_is_bounded() {
    let long = "z".repeat(10_000);
    let text = format!(r#"{{"signal": "Hold", "confidence": 0.5, "reasoning": "{long}"}}"#);
    let signal = parse(&text).unwrap();
    assert!(signal.reasoning.chars().count() <= 480);
}
