//! Web search adapters.
//!
//! Search only ever enriches a conversation, so callers that can live without
//! it use [`SearchProvider::search_or_empty`], which swallows failures.

pub mod serpapi;

pub use serpapi::{normalize_results, SerpApiClient};

use crate::error::{Result, StudyBoltError};
use crate::types::SearchResult;
use async_trait::async_trait;

/// Number of results requested when the caller does not say.
pub const DEFAULT_RESULT_LIMIT: usize = 5;

#[async_trait]
pub trait SearchProvider: Send + Sync + 'static {
    /// Provider name (used in log lines).
    fn name(&self) -> &str;

    /// Run a fresh search. Returns at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Like [`search`](Self::search), but any failure yields an empty list.
    async fn search_or_empty(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        match self.search(query, limit).await {
            Ok(results) => results,
            Err(e) => {
                log::warn!("{} search failed, continuing without results: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// Reject inputs no provider can serve.
pub fn validate_query(query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(StudyBoltError::Validation("Search query must not be empty".into()));
    }
    if limit == 0 {
        return Err(StudyBoltError::Validation(
            "Result limit must be at least 1".into(),
        ));
    }
    Ok(())
}
