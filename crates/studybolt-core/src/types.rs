use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation. Never mutated once it enters the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A normalised web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Synthetic `search-result-{rank}` identifier, 1-indexed.
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// `title`, `snippet` and `Source: link`, one per line.
    pub rendered_text: String,
}

impl SearchResult {
    pub fn new(
        rank: usize,
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let snippet = snippet.into();
        let link = link.into();
        let rendered_text = format!("{}\n{}\nSource: {}", title, snippet, link);
        Self {
            id: format!("search-result-{}", rank),
            title,
            snippet,
            link,
            rendered_text,
        }
    }

    pub fn to_source(&self) -> SourceRef {
        SourceRef {
            title: self.title.clone(),
            snippet: self.snippet.clone(),
            link: self.link.clone(),
            id: self.id.clone(),
        }
    }
}

/// The part of a search result that is kept alongside a cached summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub snippet: String,
    pub link: String,
    pub id: String,
}

/// Cache payload for the search-with-summary pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub query: String,
    pub summary: String,
    pub sources: Vec<SourceRef>,
    pub timestamp: DateTime<Utc>,
}

/// Where a [`SearchSummary`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Cache,
    Fresh,
}

impl SummarySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Fresh => "fresh",
        }
    }
}

/// A summary tagged with its origin. Serialises flat:
/// `{source, query, summary, sources, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub source: SummarySource,
    #[serde(flatten)]
    pub summary: SearchSummary,
}

/// Incoming chat request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub enable_search: bool,
}

/// One frame of the outgoing chat event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Content(String),
    Done,
    Error(String),
}

impl StreamChunk {
    pub const DONE_SENTINEL: &'static str = "[DONE]";

    /// Payload of the `data:` field for this chunk.
    pub fn to_data(&self) -> String {
        match self {
            Self::Content(content) => serde_json::json!({ "content": content }).to_string(),
            Self::Done => Self::DONE_SENTINEL.to_string(),
            Self::Error(error) => serde_json::json!({ "error": error }).to_string(),
        }
    }
}
