use super::{validate_messages, CompletionProvider, CompletionStream, EventStreamDecoder};
use crate::error::{Result, StudyBoltError};
use crate::types::{ChatMessage, StreamChunk};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const SERVICE: &str = "mistral";

#[derive(Debug, Serialize)]
struct AgentCompletionRequest<'a> {
    agent_id: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// One decoded upstream event.
#[derive(Debug, PartialEq)]
enum AgentEvent {
    Delta(String),
    Skip,
    Done,
}

/// Client for the Mistral agents completion API.
pub struct MistralAgentClient {
    client: Client,
    base_url: String,
    api_key: String,
    agent_id: String,
    timeout: Duration,
}

impl MistralAgentClient {
    /// `timeout` bounds one-shot calls and the wait for a streaming response
    /// to start; it does not cap the length of a stream.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        agent_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/agents/completions", self.base_url)
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<Response> {
        let body = AgentCompletionRequest {
            agent_id: &self.agent_id,
            messages,
            stream,
        };

        let mut request = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);
        if stream {
            request = request.header(reqwest::header::ACCEPT, "text/event-stream");
        } else {
            request = request.timeout(self.timeout);
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| StudyBoltError::Timeout {
                service: SERVICE,
                after: self.timeout,
            })?
            .map_err(|e| StudyBoltError::from_transport(SERVICE, self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StudyBoltError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionProvider for MistralAgentClient {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn complete_once(&self, messages: &[ChatMessage]) -> Result<String> {
        validate_messages(messages)?;

        let response = self.send(messages, false).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StudyBoltError::from_transport(SERVICE, self.timeout, e))?;

        Ok(body
            .pointer("/choices/0/message/content")
            .and_then(content_text)
            .unwrap_or_default())
    }

    async fn stream_completion(&self, messages: Vec<ChatMessage>) -> Result<CompletionStream> {
        validate_messages(&messages)?;

        let response = self.send(&messages, true).await?;
        let mut body = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut decoder = EventStreamDecoder::new();
            loop {
                let (payloads, mut finished) = match body.next().await {
                    Some(Ok(bytes)) => (decoder.push(&bytes), false),
                    Some(Err(e)) => {
                        yield Err(StudyBoltError::Network(e));
                        break;
                    }
                    None => (decoder.finish(), true),
                };

                for data in payloads {
                    match parse_event(&data) {
                        Ok(AgentEvent::Delta(text)) => yield Ok(text),
                        Ok(AgentEvent::Skip) => {}
                        Ok(AgentEvent::Done) => {
                            finished = true;
                            break;
                        }
                        Err(e) => {
                            yield Err(e);
                            finished = true;
                            break;
                        }
                    }
                }

                if finished {
                    break;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn parse_event(data: &str) -> Result<AgentEvent> {
    if data.trim() == StreamChunk::DONE_SENTINEL {
        return Ok(AgentEvent::Done);
    }

    let event: Value = serde_json::from_str(data).map_err(|e| StudyBoltError::Decode {
        service: SERVICE,
        message: format!("{}: {}", e, data),
    })?;

    if event.get("object").and_then(Value::as_str) == Some("error")
        || event.get("error").is_some()
    {
        let message = event
            .get("message")
            .or_else(|| event.pointer("/error/message"))
            .and_then(Value::as_str)
            .unwrap_or("upstream reported an error");
        return Err(StudyBoltError::Decode {
            service: SERVICE,
            message: message.to_string(),
        });
    }

    match event.pointer("/choices/0/delta/content").and_then(content_text) {
        Some(text) if !text.is_empty() => Ok(AgentEvent::Delta(text)),
        _ => Ok(AgentEvent::Skip),
    }
}

/// Message content is either a plain string or a list of typed chunks.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let body = serde_json::to_value(AgentCompletionRequest {
            agent_id: "ag:test",
            messages: &messages,
            stream: true,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "agent_id": "ag:test",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true
            })
        );
    }

    #[test]
    fn parses_deltas() {
        let data = r#"{"id":"x","choices":[{"index":0,"delta":{"role":"assistant","content":"Mito"}}]}"#;
        assert_eq!(parse_event(data).unwrap(), AgentEvent::Delta("Mito".into()));
    }

    #[test]
    fn empty_and_missing_deltas_skipped() {
        let role_only = r#"{"choices":[{"delta":{"role":"assistant","content":""}}]}"#;
        assert_eq!(parse_event(role_only).unwrap(), AgentEvent::Skip);

        let finish = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_event(finish).unwrap(), AgentEvent::Skip);
    }

    #[test]
    fn done_sentinel() {
        assert_eq!(parse_event("[DONE]").unwrap(), AgentEvent::Done);
    }

    #[test]
    fn error_events_and_garbage_fail() {
        assert!(parse_event(r#"{"object":"error","message":"rate limited"}"#).is_err());
        assert!(parse_event("not json").is_err());
    }

    #[test]
    fn chunked_content_concatenated() {
        let content = json!([{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]);
        assert_eq!(content_text(&content).as_deref(), Some("ab"));
        assert_eq!(content_text(&json!(null)), None);
    }
}
