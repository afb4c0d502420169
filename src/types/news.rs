use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single news item for a ticker, most-recent-first in sequences.
///
/// Fetched fresh per analysis call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    /// Short article excerpt; may be empty.
    #[serde(default)]
    pub snippet: String,
    /// Publisher name, "Unknown" when the provider omits it.
    #[serde(default)]
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(headline: &str, snippet: &str, source: &str) -> Self {
        Self {
            headline: headline.to_string(),
            snippet: snippet.to_string(),
            source: source.to_string(),
            published_at: None,
        }
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}
