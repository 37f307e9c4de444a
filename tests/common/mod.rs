//! Shared fixtures for router-level tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use console_agent_gateway::backend::{Backend, BackendError};
use console_agent_gateway::config::Config;
use console_agent_gateway::server::openai_api::{build_router, AppState};

pub const SECRET: &str = "test-agent-secret";

/// What the stub answers with.
pub enum StubReply {
    Body(String),
    Status(StatusCode),
}

/// Backend that records every query it receives.
pub struct StubBackend {
    reply: StubReply,
    queries: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new(reply: StubReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::new(StubReply::Body(
            serde_json::json!({"response": [{"text": text, "type": "TEXT"}]}).to_string(),
        ))
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn send_message(&self, query: &str) -> Result<String, BackendError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.reply {
            StubReply::Body(body) => Ok(body.clone()),
            StubReply::Status(status) => Err(BackendError::Status { status: *status }),
        }
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.auth.bearer_token = SECRET.to_string();
    config.backend.token = "backend-jwt".to_string();
    config
}

pub fn router(backend: Arc<dyn Backend>) -> Router {
    build_router(Arc::new(AppState::new(Arc::new(config()), backend)))
}

pub fn chat_request(auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-IBM-Thread-ID", "test-thread-123");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {SECRET}")
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Response<Body>) {
    let response = app.oneshot(request).await.unwrap();
    (response.status(), response)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
