//! Analysis engine: orchestrates fetch, format, reasoning and parsing.
//!
//! One `analyze()` call owns its context end to end. Engine-level failures
//! are wrapped in `AnalysisFailed` so presentation can tell "no data" from
//! "service unreachable" from "model produced garbage".

use crate::config::{Config, ContextConfig};
use crate::error::{AgentError, Result};
use crate::services::context::format_context;
use crate::services::parser::SignalParser;
use crate::services::reasoning::{
    HttpReasoningClient, MockReasoningClient, ReasoningClient, PERSONA,
};
use crate::sources::{
    MarketDataProvider, MockMarketData, MockNews, NewsProvider, YahooFinanceClient,
    YahooNewsClient,
};
use crate::types::{AnalysisContext, AnalysisReport};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrator for a single-ticker analysis.
pub struct AnalysisEngine {
    market: Arc<dyn MarketDataProvider>,
    news: Arc<dyn NewsProvider>,
    reasoning: Arc<dyn ReasoningClient>,
    parser: SignalParser,
    limits: ContextConfig,
    parse_retries: u32,
}

impl AnalysisEngine {
    /// Assemble an engine from explicit providers.
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsProvider>,
        reasoning: Arc<dyn ReasoningClient>,
        config: &Config,
    ) -> Self {
        Self {
            market,
            news,
            reasoning,
            parser: SignalParser::new(config.context.reasoning_max_chars),
            limits: config.context.clone(),
            parse_retries: config.parse_retries,
        }
    }

    /// Build an engine wired for live or mock operation.
    ///
    /// The mock/live decision happens here, once, at construction time; no
    /// component branches on it internally.
    pub fn from_config(config: &Config, mock: bool) -> Result<Self> {
        if mock {
            info!("mock mode: using canned providers, no network access");
            return Ok(Self::new(
                Arc::new(MockMarketData),
                Arc::new(MockNews),
                Arc::new(MockReasoningClient),
                config,
            ));
        }

        let timeout = Duration::from_secs(config.request_timeout_secs);
        Ok(Self::new(
            Arc::new(YahooFinanceClient::new(timeout)?),
            Arc::new(YahooNewsClient::new(timeout)?),
            Arc::new(HttpReasoningClient::from_config(config)?),
            config,
        ))
    }

    /// Run one full analysis for a ticker.
    pub async fn analyze(&self, ticker: &str) -> Result<AnalysisReport> {
        let ticker = ticker.trim().to_uppercase();
        debug!(%ticker, "fetching market data and news");

        // The two fetches are independent; run them concurrently. Market data
        // is load-bearing, news is garnish: a news failure degrades to an
        // empty list instead of failing the call.
        let (market_res, news_res) = tokio::join!(
            self.market.fetch(&ticker),
            self.news.fetch(&ticker, self.limits.news_limit)
        );

        let market = market_res.map_err(|e| AgentError::analysis_failed(&ticker, e))?;
        let news = news_res.unwrap_or_else(|e| {
            warn!(%ticker, error = %e, "news fetch failed, continuing without headlines");
            Vec::new()
        });

        let ctx = AnalysisContext { market, news };
        let body = format_context(&ctx, &self.limits);
        debug!(%ticker, prompt_chars = body.len(), "formatted analysis context");

        let AnalysisContext { market, news } = ctx;

        let mut last_err = AgentError::MalformedSignal("no completion attempted".to_string());
        for ask in 0..=self.parse_retries {
            if ask > 0 {
                warn!(%ticker, ask, "re-asking reasoning service after malformed output");
            }

            let raw = self
                .reasoning
                .complete(PERSONA, &body)
                .await
                .map_err(|e| AgentError::analysis_failed(&ticker, e))?;

            match self.parser.parse(&ticker, &raw) {
                Ok(signal) => {
                    info!(%ticker, action = %signal.action, confidence = signal.confidence,
                        "analysis complete");
                    return Ok(AnalysisReport {
                        signal,
                        market,
                        news,
                    });
                }
                Err(e) => {
                    warn!(%ticker, error = %e, "signal parse failed");
                    last_err = e;
                }
            }
        }

        Err(AgentError::analysis_failed(&ticker, last_err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reasoning::RawResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reasoning stub that replays a fixed sequence of outcomes.
    struct ScriptedReasoning {
        responses: Vec<std::result::Result<String, AgentError>>,
        calls: AtomicUsize,
    }

    impl ScriptedReasoning {
        fn new(responses: Vec<std::result::Result<String, AgentError>>) -> Self {
            Self {
                responses,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReasoningClient for ScriptedReasoning {
        async fn complete(&self, _persona: &str, _body: &str) -> Result<RawResponse> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(idx.min(self.responses.len() - 1)).unwrap() {
                Ok(text) => Ok(RawResponse::from_text(text)),
                Err(AgentError::ServiceUnavailable(msg)) => {
                    Err(AgentError::ServiceUnavailable(msg.clone()))
                }
                Err(AgentError::Authentication(msg)) => {
                    Err(AgentError::Authentication(msg.clone()))
                }
                Err(_) => unreachable!("script only holds transport errors"),
            }
        }
    }

    fn engine_with(reasoning: Arc<dyn ReasoningClient>) -> AnalysisEngine {
        AnalysisEngine::new(
            Arc::new(MockMarketData),
            Arc::new(MockNews),
            reasoning,
            &Config::default(),
        )
    }

    const VALID: &str = r#"{"signal": "Buy", "confidence": 0.8, "reasoning": "Clean breakout."}"#;

    #[tokio::test]
    async fn test_analyze_happy_path() {
        let engine = engine_with(Arc::new(MockReasoningClient));
        let report = engine.analyze("tsla").await.unwrap();
        assert_eq!(report.signal.ticker, "TSLA");
        assert!((0.0..=1.0).contains(&report.signal.confidence));
        assert!(!report.signal.reasoning.is_empty());
        assert_eq!(report.market.ticker, "TSLA");
        assert_eq!(report.news.len(), 2);
    }

    #[tokio::test]
    async fn test_analyze_retries_once_on_malformed_output() {
        let scripted = Arc::new(ScriptedReasoning::new(vec![
            Ok("utter nonsense with no signal".to_string()),
            Ok(VALID.to_string()),
        ]));
        let engine = engine_with(scripted.clone());
        let report = engine.analyze("NVDA").await.unwrap();
        assert_eq!(scripted.call_count(), 2);
        assert_eq!(report.signal.confidence, 0.8);
    }

    #[tokio::test]
    async fn test_analyze_surfaces_malformed_after_retry_budget() {
        let scripted = Arc::new(ScriptedReasoning::new(vec![Ok(
            "still nonsense".to_string()
        )]));
        let engine = engine_with(scripted.clone());
        let err = engine.analyze("NVDA").await.unwrap_err();
        // default parse_retries = 1 → two asks total
        assert_eq!(scripted.call_count(), 2);
        assert!(matches!(
            err.root_cause(),
            AgentError::MalformedSignal(_)
        ));
    }

    #[tokio::test]
    async fn test_analyze_wraps_service_unavailable() {
        let scripted = Arc::new(ScriptedReasoning::new(vec![Err(
            AgentError::ServiceUnavailable("gave up after 3 attempts".to_string()),
        )]));
        let engine = engine_with(scripted);
        let err = engine.analyze("SPY").await.unwrap_err();
        assert!(matches!(err, AgentError::AnalysisFailed { .. }));
        assert!(matches!(
            err.root_cause(),
            AgentError::ServiceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_analyze_does_not_reask_on_transport_error() {
        let scripted = Arc::new(ScriptedReasoning::new(vec![Err(
            AgentError::ServiceUnavailable("down".to_string()),
        )]));
        let engine = engine_with(scripted.clone());
        let _ = engine.analyze("SPY").await.unwrap_err();
        // Transport failures already exhausted the client's own retries;
        // the engine's re-ask budget is for malformed output only.
        assert_eq!(scripted.call_count(), 1);
    }
}
