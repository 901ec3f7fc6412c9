use super::ChatPipeline;
use crate::completion::CompletionStream;
use crate::error::{Result, StudyBoltError};
use crate::types::{ChatMessage, ChatRequest, StreamChunk};
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::mpsc;

/// Error text sent to the caller when a stream fails. Details stay in the logs.
pub const GENERIC_STREAM_ERROR: &str = "Failed to generate response";

/// Framed chunks for one chat request: zero or more `Content`, then exactly
/// one `Done` or `Error`.
pub type ChatStream = BoxStream<'static, StreamChunk>;

/// How a chat worker finished.
#[derive(Debug)]
enum StreamOutcome {
    Completed,
    Failed,
    /// The caller went away; the upstream stream was dropped early.
    Abandoned,
}

enum Forwarded {
    Completed,
    Abandoned,
}

impl ChatPipeline {
    /// Validate `request` and start streaming its completion.
    ///
    /// Validation errors are returned before any stream exists. Otherwise a
    /// worker task performs the optional search, opens exactly one upstream
    /// completion stream and forwards each fragment in arrival order. Dropping
    /// the returned stream cancels the worker.
    pub fn stream_chat(&self, request: ChatRequest) -> Result<ChatStream> {
        Self::validate(&request.messages)?;

        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let pipeline = self.clone();
        tokio::spawn(async move {
            let outcome = pipeline.drive(request, tx).await;
            log::debug!("chat stream finished: {:?}", outcome);
        });

        Ok(Box::pin(async_stream::stream! {
            while let Some(chunk) = rx.recv().await {
                yield chunk;
            }
        }))
    }

    async fn drive(self, request: ChatRequest, tx: mpsc::Sender<StreamChunk>) -> StreamOutcome {
        let messages = tokio::select! {
            _ = tx.closed() => return StreamOutcome::Abandoned,
            messages = self.prepare(&request) => messages,
        };

        match self.forward(messages, &tx).await {
            Ok(Forwarded::Completed) => {
                if tx.send(StreamChunk::Done).await.is_err() {
                    return StreamOutcome::Abandoned;
                }
                StreamOutcome::Completed
            }
            Ok(Forwarded::Abandoned) => {
                log::debug!("caller disconnected, abandoning upstream stream");
                StreamOutcome::Abandoned
            }
            Err(e) => {
                log::error!("chat stream failed: {}", e);
                let _ = tx.send(StreamChunk::Error(GENERIC_STREAM_ERROR.to_string())).await;
                StreamOutcome::Failed
            }
        }
    }

    async fn forward(
        &self,
        messages: Vec<ChatMessage>,
        tx: &mpsc::Sender<StreamChunk>,
    ) -> Result<Forwarded> {
        let mut upstream: CompletionStream = tokio::select! {
            _ = tx.closed() => return Ok(Forwarded::Abandoned),
            opened = self.completion.stream_completion(messages) => opened?,
        };

        let idle = self.config.stream_idle_timeout;
        loop {
            let next = tokio::select! {
                _ = tx.closed() => return Ok(Forwarded::Abandoned),
                next = tokio::time::timeout(idle, upstream.next()) => next,
            };

            match next {
                Err(_) => {
                    return Err(StudyBoltError::Timeout {
                        service: "completion stream",
                        after: idle,
                    })
                }
                Ok(None) => return Ok(Forwarded::Completed),
                Ok(Some(Err(e))) => return Err(e),
                Ok(Some(Ok(text))) => {
                    if tx.send(StreamChunk::Content(text)).await.is_err() {
                        return Ok(Forwarded::Abandoned);
                    }
                }
            }
        }
    }
}
