use super::ChatPipeline;
use crate::augment::summary_messages;
use crate::cache::cache_key;
use crate::error::{Result, StudyBoltError};
use crate::types::{SearchOutcome, SearchSummary, SummarySource};
use chrono::Utc;

impl ChatPipeline {
    /// Search for `query` and summarize the results, memoized per `(query, limit)`.
    ///
    /// A cache that cannot be read is treated as a miss, and a failed write
    /// only costs future requests a miss. Summaries built from zero results
    /// are returned but not cached.
    pub async fn search_with_summary(&self, query: &str, limit: usize) -> Result<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(StudyBoltError::Validation("Query is required".to_string()));
        }
        if limit == 0 {
            return Err(StudyBoltError::Validation(
                "numResults must be at least 1".to_string(),
            ));
        }
        let limit = limit.min(self.config.max_search_results.max(1));
        let key = cache_key(query, limit);

        if let Some(summary) = self.cached_summary(&key).await {
            return Ok(SearchOutcome {
                source: SummarySource::Cache,
                summary,
            });
        }

        let results = self.search.search_or_empty(query, limit).await;
        let summary = self
            .completion
            .complete_once(&summary_messages(query, &results))
            .await?;

        let summary = SearchSummary {
            query: query.to_string(),
            summary,
            sources: results.iter().take(limit).map(|r| r.to_source()).collect(),
            timestamp: Utc::now(),
        };

        if summary.sources.is_empty() {
            log::info!("not caching summary for {:?}: no search results", query);
        } else {
            self.store_summary(&key, &summary).await;
        }

        Ok(SearchOutcome {
            source: SummarySource::Fresh,
            summary,
        })
    }

    async fn cached_summary(&self, key: &str) -> Option<SearchSummary> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("{} cache read failed, treating as miss: {}", self.cache.name(), e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(summary) => Some(summary),
            Err(e) => {
                log::warn!("discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store_summary(&self, key: &str, summary: &SearchSummary) {
        let raw = match serde_json::to_string(summary) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("could not serialize summary for caching: {}", e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &raw, self.config.cache_ttl).await {
            log::warn!("{} cache write failed: {}", self.cache.name(), e);
        }
    }
}
