use crate::error::{AgentError, Result};
use std::env;

/// Retry/backoff configuration for the reasoning client.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included).
    pub max_attempts: u32,
    /// Initial backoff delay in milliseconds.
    pub base_ms: u64,
    /// Maximum backoff delay in milliseconds.
    pub max_ms: u64,
    /// Jitter as a fraction of the delay (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_ms: 500,
            max_ms: 10_000,
            jitter: 0.1,
        }
    }
}

/// Prompt/context formatting limits.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Maximum number of headlines included in the prompt.
    pub news_limit: usize,
    /// Per-headline character limit.
    pub headline_max_chars: usize,
    /// Upper bound on signal reasoning length.
    pub reasoning_max_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            news_limit: 3,
            headline_max_chars: 120,
            reasoning_max_chars: 480,
        }
    }
}

/// Application configuration.
///
/// Built once at startup from environment variables and treated as read-only
/// afterwards; components receive it by reference at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the reasoning endpoint (required unless mock mode).
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible reasoning endpoint.
    pub api_base: String,
    /// Model name sent with each completion request.
    pub model: String,
    /// Tickers shown on the live dashboard.
    pub watchlist: Vec<String>,
    /// Dashboard refresh interval in seconds.
    pub refresh_secs: u64,
    /// Timeout for every network call, in seconds.
    pub request_timeout_secs: u64,
    /// Reasoning-transport retry settings.
    pub retry: RetryConfig,
    /// Engine-level re-ask budget when the model output is malformed.
    pub parse_retries: u32,
    /// Prompt formatting limits.
    pub context: ContextConfig,
    /// Telegram bot token for signal alerts (optional).
    pub telegram_bot_token: Option<String>,
    /// Telegram chat ID for signal alerts (optional).
    pub telegram_chat_id: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let watchlist = env::var("AUGUR_WATCHLIST")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_uppercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| {
                ["NVDA", "TSLA", "SPY", "BTC-USD"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        Self {
            api_key: env::var("AUGUR_API_KEY").ok().filter(|k| !k.is_empty()),
            api_base: env::var("AUGUR_API_BASE")
                .unwrap_or_else(|_| "https://integrate.api.nvidia.com/v1".to_string()),
            model: env::var("AUGUR_MODEL")
                .unwrap_or_else(|_| "meta/llama3-8b-instruct".to_string()),
            watchlist,
            refresh_secs: env_parse("AUGUR_REFRESH_SECS", 300),
            request_timeout_secs: env_parse("AUGUR_TIMEOUT_SECS", 30),
            retry: RetryConfig {
                max_attempts: env_parse("AUGUR_MAX_ATTEMPTS", 3),
                base_ms: env_parse("AUGUR_BACKOFF_BASE_MS", 500),
                max_ms: env_parse("AUGUR_BACKOFF_MAX_MS", 10_000),
                jitter: env_parse("AUGUR_BACKOFF_JITTER", 0.1),
            },
            parse_retries: env_parse("AUGUR_PARSE_RETRIES", 1),
            context: ContextConfig {
                news_limit: env_parse("AUGUR_NEWS_LIMIT", 3),
                headline_max_chars: env_parse("AUGUR_HEADLINE_MAX_CHARS", 120),
                reasoning_max_chars: env_parse("AUGUR_REASONING_MAX_CHARS", 480),
            },
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|v| !v.is_empty()),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok().filter(|v| !v.is_empty()),
        }
    }

    /// Return the API key, failing when it is absent.
    ///
    /// Called once at startup before live clients are built, so a missing key
    /// is a fatal startup error rather than a per-call surprise.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            AgentError::Config(
                "AUGUR_API_KEY is not set; required unless running with --mock".to_string(),
            )
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://integrate.api.nvidia.com/v1".to_string(),
            model: "meta/llama3-8b-instruct".to_string(),
            watchlist: ["NVDA", "TSLA", "SPY", "BTC-USD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refresh_secs: 300,
            request_timeout_secs: 30,
            retry: RetryConfig::default(),
            parse_retries: 1,
            context: ContextConfig::default(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}
