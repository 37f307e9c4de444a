//! HTTP client for the backend conversational API.
//!
//! The backend is stateless and cannot stream: every query is one POST of
//! `{"input": {"text": query}}` answered by one JSON document.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::BackendConfig;

/// A failed backend round trip. Both variants mean "backend unavailable"
/// to callers; they are kept apart for logging.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend answered with something other than 200.
    #[error("backend returned HTTP {status}")]
    Status { status: StatusCode },

    /// The request never completed (DNS, TLS, refused, timeout, body read).
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Anything that can answer a single plain-text query.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send `query` and return the raw body of a 200 reply.
    async fn send_message(&self, query: &str) -> Result<String, BackendError>;
}

#[derive(Debug, Serialize)]
struct TalkRequest<'a> {
    input: TalkInput<'a>,
}

#[derive(Debug, Serialize)]
struct TalkInput<'a> {
    text: &'a str,
}

/// Client for the console virtual-assistant talk endpoint.
pub struct ConsoleClient {
    http: reqwest::Client,
    url: String,
    token: String,
}

impl ConsoleClient {
    /// Create a client from backend configuration. Transport defaults
    /// (including timeouts) are left untouched.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            token: config.token.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a backend credential is configured at all.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

#[async_trait]
impl Backend for ConsoleClient {
    async fn send_message(&self, query: &str) -> Result<String, BackendError> {
        let body = TalkRequest {
            input: TalkInput { text: query },
        };

        info!(method = "POST", url = %self.url, query_len = query.len(), "Calling backend");

        let start = Instant::now();
        let response = self
            .http
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(
                    url = %self.url,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Backend request failed"
                );
                BackendError::Transport(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            url = %self.url,
            status = status.as_u16(),
            elapsed_ms,
            body_len = text.len(),
            "Backend responded"
        );
        debug!(body = %text, "Backend response body");

        if status != StatusCode::OK {
            error!(status = status.as_u16(), "Backend returned non-200 status");
            return Err(BackendError::Status { status });
        }

        Ok(text)
    }
}
