//! Chat pipeline: turns a chat request into a framed event stream, and a
//! search query into a cached, summarized answer.

mod chat;
mod summary;

pub use chat::{ChatStream, GENERIC_STREAM_ERROR};

use crate::augment::augment;
use crate::cache::{CacheStore, DEFAULT_TTL};
use crate::completion::{validate_messages, CompletionProvider};
use crate::error::Result;
use crate::search::{SearchProvider, DEFAULT_RESULT_LIMIT};
use crate::types::{ChatMessage, ChatRequest, Role};
use std::sync::Arc;
use std::time::Duration;

/// Tunables for [`ChatPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Results fetched when augmenting a chat with search.
    pub chat_search_results: usize,
    /// Upper bound applied to the caller's requested result count.
    pub max_search_results: usize,
    /// Lifetime of a cached search summary.
    pub cache_ttl: Duration,
    /// Longest wait for the next fragment of a streaming completion.
    pub stream_idle_timeout: Duration,
    /// Fragments buffered between the upstream reader and the caller.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chat_search_results: DEFAULT_RESULT_LIMIT,
            max_search_results: 20,
            cache_ttl: DEFAULT_TTL,
            stream_idle_timeout: Duration::from_secs(60),
            channel_capacity: 32,
        }
    }
}

/// Orchestrates search, augmentation, completion and caching for one request
/// at a time. Cloning is cheap; clones share the same collaborators.
#[derive(Clone)]
pub struct ChatPipeline {
    search: Arc<dyn SearchProvider>,
    completion: Arc<dyn CompletionProvider>,
    cache: Arc<dyn CacheStore>,
    config: PipelineConfig,
}

impl ChatPipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionProvider>,
        cache: Arc<dyn CacheStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search,
            completion,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn agent_id(&self) -> &str {
        self.completion.agent_id()
    }

    /// Reject requests that must not open a stream.
    pub fn validate(messages: &[ChatMessage]) -> Result<()> {
        validate_messages(messages)
    }

    /// Messages to send upstream for `request`.
    ///
    /// With search enabled and a trailing user message, the history is wrapped
    /// with search context. A failed search degrades to empty context.
    pub async fn prepare(&self, request: &ChatRequest) -> Vec<ChatMessage> {
        if !request.enable_search {
            return request.messages.clone();
        }

        match request.messages.last() {
            Some(last) if last.role == Role::User => {
                let results = self
                    .search
                    .search_or_empty(&last.content, self.config.chat_search_results)
                    .await;
                log::debug!("augmenting chat with {} search results", results.len());
                augment(&request.messages, &results)
            }
            _ => request.messages.clone(),
        }
    }
}
