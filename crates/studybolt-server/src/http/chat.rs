use super::{AppError, AppResult, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use studybolt_core::{ChatRequest, StreamChunk};
use tracing::{info, warn};
use uuid::Uuid;

const MESSAGES_REQUIRED: &str = "Messages array is required";

/// `POST /api/chat`: stream a completion as server-sent events.
///
/// Malformed bodies and empty message lists get a 400 before the stream
/// opens. Once it is open every event is `data: {"content": ...}`, ending
/// with `data: [DONE]` or a single `data: {"error": ...}`.
pub(super) async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected chat body: {}", rejection.body_text());
        state.metrics.record_failure("chat");
        AppError::bad_request(MESSAGES_REQUIRED)
    })?;

    let request_id = Uuid::now_v7();
    let message_count = request.messages.len();
    let enable_search = request.enable_search;

    let chunks = state.pipeline.stream_chat(request).map_err(|e| {
        state.metrics.record_failure("chat");
        AppError::from(e)
    })?;
    state.metrics.chat_requests.inc();
    info!(%request_id, message_count, enable_search, "Chat stream opened");

    let metrics = state.metrics.clone();
    let events = async_stream::stream! {
        let mut chunks = chunks;
        while let Some(chunk) = chunks.next().await {
            match &chunk {
                StreamChunk::Done => {
                    metrics.record_stream_end("done");
                    info!(%request_id, "Chat stream completed");
                }
                StreamChunk::Error(_) => {
                    metrics.record_stream_end("error");
                    metrics.record_failure("chat");
                    warn!(%request_id, "Chat stream failed");
                }
                StreamChunk::Content(_) => {}
            }
            yield Ok(Event::default().data(chunk.to_data()));
        }
    };

    Ok(Sse::new(events))
}
