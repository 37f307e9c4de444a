//! SSE (Server-Sent Events) emulation over a non-streaming backend.
//!
//! The backend answers in one piece, so a "stream" is always exactly:
//! one content chunk, one finish chunk, then the `[DONE]` sentinel.
//! [`SseFrames`] yields the payloads of those events in that order and then ends.

use std::convert::Infallible;

use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, info};

use crate::server::openai_api::CompletionMeta;

/// Payload of the terminal event of every stream.
pub const DONE: &str = "[DONE]";

/// Sent if even the error chunk cannot be serialized.
const FALLBACK_ERROR: &str = "{\"error\":{\"message\":\"failed to encode stream chunk\"}}";

/// Streaming chat completion chunk (OpenAI-compatible).
#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Serialize)]
pub struct ChunkChoice {
    pub index: usize,
    pub delta: ChunkDelta,
    pub finish_reason: Option<&'static str>,
}

#[derive(Debug, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Turns a chunk into its JSON payload.
pub type ChunkEncoder = fn(&ChatCompletionChunk) -> serde_json::Result<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Content,
    Finish,
    Done,
    Exhausted,
}

/// Finite, single-pass sequence of event payloads for one response.
pub struct SseFrames {
    meta: CompletionMeta,
    content: Option<String>,
    request_id: String,
    stage: Stage,
    encode: ChunkEncoder,
}

impl SseFrames {
    pub fn new(meta: CompletionMeta, content: String, request_id: impl Into<String>) -> Self {
        Self::with_encoder(meta, content, request_id, serde_json::to_string::<ChatCompletionChunk>)
    }

    /// Same as [`SseFrames::new`] with a custom chunk encoder.
    pub fn with_encoder(
        meta: CompletionMeta,
        content: String,
        request_id: impl Into<String>,
        encode: ChunkEncoder,
    ) -> Self {
        Self {
            meta,
            content: Some(content),
            request_id: request_id.into(),
            stage: Stage::Content,
            encode,
        }
    }

    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<&'static str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.meta.id.clone(),
            object: "chat.completion.chunk",
            created: self.meta.created,
            model: self.meta.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    fn render(&self, chunk: &ChatCompletionChunk) -> String {
        match (self.encode)(chunk) {
            Ok(data) => data,
            Err(e) => {
                error!(request_id = %self.request_id, error = %e, "Failed to encode stream chunk");
                self.error_payload(&e)
            }
        }
    }

    /// In-band error chunk standing in for a chunk that could not be built.
    fn error_payload(&self, e: &serde_json::Error) -> String {
        let delta = ChunkDelta {
            content: Some(format!("Error: {e}")),
        };
        serde_json::to_string(&self.chunk(delta, None))
            .unwrap_or_else(|_| FALLBACK_ERROR.to_string())
    }

    /// Wrap the frames in a `text/event-stream` response.
    pub fn into_response(self) -> Response {
        let events = self.map(|data| Ok::<_, Infallible>(Event::default().data(data)));
        Sse::new(futures::stream::iter(events)).into_response()
    }
}

impl Iterator for SseFrames {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self.stage {
            Stage::Content => {
                info!(request_id = %self.request_id, "Simulating streaming response");
                self.stage = Stage::Finish;
                let delta = ChunkDelta {
                    content: Some(self.content.take().unwrap_or_default()),
                };
                Some(self.render(&self.chunk(delta, None)))
            }
            Stage::Finish => {
                self.stage = Stage::Done;
                Some(self.render(&self.chunk(ChunkDelta::default(), Some("stop"))))
            }
            Stage::Done => {
                self.stage = Stage::Exhausted;
                info!(request_id = %self.request_id, "Simulated streaming response completed");
                Some(DONE.to_string())
            }
            Stage::Exhausted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value;

    use super::*;

    fn meta() -> CompletionMeta {
        CompletionMeta {
            id: "chatcmpl-abcd1234".to_string(),
            created: 1_700_000_000,
            model: "red-hat-console-agent".to_string(),
        }
    }

    fn payload(data: &str) -> Value {
        serde_json::from_str(data).unwrap()
    }

    /// Fails on every chunk that carries content, like a serializer hitting bad data.
    fn reject_content(chunk: &ChatCompletionChunk) -> serde_json::Result<String> {
        let has_content = chunk.choices.iter().any(|c| c.delta.content.is_some());
        if has_content {
            Err(<serde_json::Error as serde::ser::Error>::custom("boom"))
        } else {
            serde_json::to_string(chunk)
        }
    }

    #[test]
    fn test_two_chunks_then_done() {
        let frames: Vec<String> = SseFrames::new(meta(), "Hello".to_string(), "req").collect();
        assert_eq!(frames.len(), 3);

        let first = payload(&frames[0]);
        assert_eq!(first["object"], "chat.completion.chunk");
        assert_eq!(first["choices"][0]["delta"]["content"], "Hello");
        assert!(first["choices"][0]["finish_reason"].is_null());

        let second = payload(&frames[1]);
        assert_eq!(second["choices"][0]["delta"], serde_json::json!({}));
        assert_eq!(second["choices"][0]["finish_reason"], "stop");

        assert_eq!(frames[2], DONE);
    }

    #[test]
    fn test_chunks_share_id_and_created() {
        let frames: Vec<String> = SseFrames::new(meta(), "x".to_string(), "req").collect();
        let first = payload(&frames[0]);
        let second = payload(&frames[1]);

        assert_eq!(first["id"], "chatcmpl-abcd1234");
        assert_eq!(first["id"], second["id"]);
        assert_eq!(first["created"], second["created"]);
        assert_eq!(first["model"], second["model"]);
    }

    #[test]
    fn test_exhausted_stays_exhausted() {
        let mut frames = SseFrames::new(meta(), "x".to_string(), "req");
        assert_eq!(frames.by_ref().count(), 3);
        assert!(frames.next().is_none());
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_multiline_content_stays_in_one_frame() {
        let content = "Pick one\n\nOptions:\n1. A\n2. B".to_string();
        let frames: Vec<String> = SseFrames::new(meta(), content.clone(), "req").collect();
        assert!(!frames[0].contains('\n'));
        assert_eq!(payload(&frames[0])["choices"][0]["delta"]["content"], content.as_str());
    }

    #[test]
    fn test_encode_failure_still_finishes_stream() {
        let frames: Vec<String> =
            SseFrames::with_encoder(meta(), "Hello".to_string(), "req", reject_content).collect();
        assert_eq!(frames.len(), 3);

        let error = payload(&frames[0]);
        assert_eq!(error["choices"][0]["delta"]["content"], "Error: boom");
        assert_eq!(error["id"], "chatcmpl-abcd1234");

        let finish = payload(&frames[1]);
        assert_eq!(finish["choices"][0]["finish_reason"], "stop");
        assert_eq!(finish["id"], error["id"]);

        assert_eq!(frames[2], DONE);
    }

    #[tokio::test]
    async fn test_response_wire_bytes() {
        let frames: Vec<String> = SseFrames::new(meta(), "Hello".to_string(), "req").collect();
        let expected = format!("data: {}\n\ndata: {}\n\ndata: [DONE]\n\n", frames[0], frames[1]);

        let response = SseFrames::new(meta(), "Hello".to_string(), "req").into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/event-stream");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), expected);
    }
}
