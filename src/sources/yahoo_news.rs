//! Yahoo Finance news client.
//!
//! Pulls recent headlines for a ticker from the unofficial Yahoo Finance
//! search API. No news is a valid outcome, never an error.

use crate::error::{AgentError, Result};
use crate::sources::NewsProvider;
use crate::types::NewsItem;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    news: Vec<YahooNewsEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooNewsEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    publisher: String,
    /// Unix seconds.
    provider_publish_time: Option<i64>,
}

/// Yahoo Finance news client.
pub struct YahooNewsClient {
    client: Client,
}

impl YahooNewsClient {
    /// Create a new client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl NewsProvider for YahooNewsClient {
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let url = format!(
            "https://query1.finance.yahoo.com/v1/finance/search?q={}&newsCount={}&quotesCount=0",
            query, limit
        );

        debug!(%query, limit, "fetching Yahoo Finance news");

        let unavailable = |reason: String| AgentError::DataUnavailable {
            ticker: query.to_uppercase(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("API error: {}", response.status())));
        }

        let data: YahooSearchResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("parse error: {e}")))?;

        let mut items: Vec<NewsItem> = data
            .news
            .into_iter()
            .filter(|entry| !entry.title.trim().is_empty())
            .map(|entry| {
                let source = if entry.publisher.is_empty() {
                    "Unknown".to_string()
                } else {
                    entry.publisher
                };
                NewsItem {
                    headline: entry.title,
                    snippet: String::new(),
                    source,
                    published_at: entry
                        .provider_publish_time
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                }
            })
            .collect();

        // Most-recent-first; undated entries sink to the end.
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(limit);

        Ok(items)
    }
}
