//! Telegram signal alerts.
//!
//! Best-effort: a failed alert is a logged warning, never an analysis
//! failure.

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::types::TradeSignal;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Sends trading alerts to a Telegram chat using a bot token and chat ID.
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Build a notifier when both token and chat ID are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let bot_token = config.telegram_bot_token.clone()?;
        let chat_id = config.telegram_chat_id.clone()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            client,
            bot_token,
            chat_id,
        })
    }

    fn format_message(signal: &TradeSignal) -> String {
        let stop_loss = signal
            .stop_loss
            .map(|sl| format!(" | Stop Loss: ${sl:.2}"))
            .unwrap_or_default();
        format!(
            "{} signal: {} | Confidence: {:.0}%{}\nReason: {}",
            signal.action.to_string().to_uppercase(),
            signal.ticker,
            signal.confidence * 100.0,
            stop_loss,
            signal.reasoning
        )
    }

    /// Send an alert for a signal. Logs and swallows delivery failures.
    pub async fn send_alert(&self, signal: &TradeSignal) {
        if let Err(e) = self.try_send(signal).await {
            warn!(ticker = %signal.ticker, error = %e, "failed to send Telegram alert");
        } else {
            info!(ticker = %signal.ticker, action = %signal.action, "sent Telegram alert");
        }
    }

    async fn try_send(&self, signal: &TradeSignal) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let text = Self::format_message(signal);
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: &text,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AgentError::ServiceUnavailable(format!("telegram request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AgentError::ServiceUnavailable(format!(
                "telegram returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
