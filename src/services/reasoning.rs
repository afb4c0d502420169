//! Reasoning client for the remote language-model endpoint.
//!
//! Owns the request/response contract with an OpenAI-compatible chat
//! completions API. Transport failures are retried under the injected
//! [`RetryPolicy`]; authentication failures are surfaced immediately.

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::services::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Fixed persona (system) instruction sent with every completion request.
pub const PERSONA: &str = "You are a cynical, quantitative hedge fund trader. Your focus is on \
risk aversion. You are analytical, data-driven, and deeply skeptical of market hype. Identify \
key trends, support/resistance levels, and any divergences between price action and indicators. \
Your analysis must be concise and based *only* on the data provided. Your final output *must* \
be a JSON object with the fields: 'signal' (Buy, Sell, Hold), 'confidence' (0.0-1.0), \
'reasoning' (a brief, cynical analysis), and 'stop_loss' (a price or null).";

/// Raw completion text plus request metadata.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub text: String,
    pub latency_ms: u64,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl RawResponse {
    /// A response carrying only text, for stubs and tests.
    pub fn from_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            latency_ms: 0,
            prompt_tokens: None,
            completion_tokens: None,
        }
    }
}

/// Capability interface for the reasoning endpoint.
///
/// Two implementations exist: the network-backed client and a deterministic
/// mock. Which one an engine holds is decided at construction time.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn complete(&self, persona: &str, prompt_body: &str) -> Result<RawResponse>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

/// Network-backed reasoning client.
pub struct HttpReasoningClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    policy: RetryPolicy,
}

impl HttpReasoningClient {
    /// Build a client from configuration. Fails when the API key is absent.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            policy: RetryPolicy::new(&config.retry),
        })
    }

    async fn attempt(&self, persona: &str, prompt_body: &str) -> Result<RawResponse> {
        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: persona,
                },
                ChatMessage {
                    role: "user",
                    content: prompt_body,
                },
            ],
            temperature: 0.3,
            max_tokens: 256,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ServiceUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AgentError::Authentication(format!(
                    "reasoning endpoint rejected credentials ({status})"
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(AgentError::RateLimited { retry_after_secs });
            }
            s if !s.is_success() => {
                return Err(AgentError::ServiceUnavailable(format!(
                    "reasoning endpoint returned {s}"
                )));
            }
            _ => {}
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ServiceUnavailable(format!("invalid response body: {e}")))?;

        let latency_ms = started.elapsed().as_millis() as u64;
        let (prompt_tokens, completion_tokens) = body
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((None, None));

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(latency_ms, "reasoning completion received");

        Ok(RawResponse {
            text,
            latency_ms,
            prompt_tokens,
            completion_tokens,
        })
    }
}

#[async_trait]
impl ReasoningClient for HttpReasoningClient {
    async fn complete(&self, persona: &str, prompt_body: &str) -> Result<RawResponse> {
        self.policy
            .run(|| self.attempt(persona, prompt_body))
            .await
    }
}

/// Deterministic stand-in for the reasoning endpoint. Zero network calls.
pub struct MockReasoningClient;

impl MockReasoningClient {
    /// The canned completion returned for every request.
    pub const CANNED_RESPONSE: &'static str = r#"{
  "signal": "Hold",
  "confidence": 0.65,
  "reasoning": "Price is consolidating near the 50-period EMA and RSI is neutral. Hype in the headlines is not backed by the tape; waiting for a clearer catalyst before taking a position.",
  "stop_loss": null
}"#;
}

#[async_trait]
impl ReasoningClient for MockReasoningClient {
    async fn complete(&self, _persona: &str, _prompt_body: &str) -> Result<RawResponse> {
        Ok(RawResponse::from_text(Self::CANNED_RESPONSE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_roles_in_order() {
        let request = ChatRequest {
            model: "meta/llama3-8b-instruct",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "persona",
                },
                ChatMessage {
                    role: "user",
                    content: "body",
                },
            ],
            temperature: 0.3,
            max_tokens: 256,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn test_chat_response_deserializes_usage() {
        let json = r#"{
            "choices": [{"message": {"content": "{\"signal\": \"Hold\"}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices.len(), 1);
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, Some(120));
        assert_eq!(usage.completion_tokens, Some(40));
    }

    #[test]
    fn test_chat_response_tolerates_missing_content() {
        let json = r#"{"choices": [{"message": {}}], "usage": null}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_mock_client_is_deterministic() {
        let client = MockReasoningClient;
        let a = client.complete(PERSONA, "anything").await.unwrap();
        let b = client.complete(PERSONA, "something else").await.unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.latency_ms, 0);
    }
}
