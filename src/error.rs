use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No data available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("Reasoning service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited by reasoning service")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Malformed signal response: {0}")]
    MalformedSignal(String),

    #[error("Analysis failed for {ticker}")]
    AnalysisFailed {
        ticker: String,
        #[source]
        source: Box<AgentError>,
    },
}

impl AgentError {
    /// Wrap an error as an analysis failure for the given ticker.
    pub fn analysis_failed(ticker: &str, source: AgentError) -> Self {
        Self::AnalysisFailed {
            ticker: ticker.to_string(),
            source: Box::new(source),
        }
    }

    /// Whether the reasoning client may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ServiceUnavailable(_) | AgentError::RateLimited { .. }
        )
    }

    /// Unwrap `AnalysisFailed` layers down to the underlying cause.
    pub fn root_cause(&self) -> &AgentError {
        match self {
            AgentError::AnalysisFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AgentError::ServiceUnavailable("timeout".into()).is_retryable());
        assert!(AgentError::RateLimited {
            retry_after_secs: Some(2)
        }
        .is_retryable());
        assert!(!AgentError::Authentication("bad key".into()).is_retryable());
        assert!(!AgentError::MalformedSignal("garbage".into()).is_retryable());
        assert!(!AgentError::Config("missing key".into()).is_retryable());
    }

    #[test]
    fn test_root_cause_unwraps_nested_failures() {
        let err = AgentError::analysis_failed(
            "TSLA",
            AgentError::ServiceUnavailable("gave up after 3 attempts".into()),
        );
        assert!(matches!(
            err.root_cause(),
            AgentError::ServiceUnavailable(_)
        ));
    }

    #[test]
    fn test_data_unavailable_display() {
        let err = AgentError::DataUnavailable {
            ticker: "ZZZZ".to_string(),
            reason: "unknown symbol".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ZZZZ"));
        assert!(msg.contains("unknown symbol"));
    }
}
