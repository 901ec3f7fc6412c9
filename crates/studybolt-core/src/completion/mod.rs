//! Hosted agent completion adapters.

pub mod event_stream;
pub mod mistral;

pub use event_stream::EventStreamDecoder;
pub use mistral::MistralAgentClient;

use crate::error::{Result, StudyBoltError};
use crate::types::ChatMessage;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Incremental text fragments from an agent, in arrival order.
/// Finite and single-use; dropping it releases the upstream connection.
pub type CompletionStream = BoxStream<'static, Result<String>>;

/// A conversational agent addressed by a fixed, pre-configured identity.
#[async_trait]
pub trait CompletionProvider: Send + Sync + 'static {
    /// Identity of the agent every call is addressed to.
    fn agent_id(&self) -> &str;

    /// Single request/response completion.
    async fn complete_once(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Open a streaming completion. Errors opening the stream are returned
    /// directly; errors after that arrive as items of the stream.
    async fn stream_completion(&self, messages: Vec<ChatMessage>) -> Result<CompletionStream>;
}

pub fn validate_messages(messages: &[ChatMessage]) -> Result<()> {
    if messages.is_empty() {
        return Err(StudyBoltError::Validation(
            "Messages array is required".to_string(),
        ));
    }
    Ok(())
}
