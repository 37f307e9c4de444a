//! OpenAI-style HTTP API.
//!
//! - GET /v1/agents
//! - POST /v1/chat
//!
//! Both routes sit behind the bearer middleware.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{require_bearer, BearerAuth};
use crate::backend::{normalize, Backend};
use crate::config::Config;
use crate::server::error::ApiError;
use crate::server::streaming::SseFrames;

/// Correlation header sent by the orchestrating caller.
pub const THREAD_ID_HEADER: &str = "x-ibm-thread-id";

/// Application state shared across handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: BearerAuth,
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    pub fn new(config: Arc<Config>, backend: Arc<dyn Backend>) -> Self {
        let auth = BearerAuth::new(config.auth.bearer_token.as_str());
        Self {
            config,
            auth,
            backend,
        }
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/agents", get(discover_agents))
        .route("/v1/chat", post(chat))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), require_bearer)),
        )
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    #[serde(other)]
    Other,
}

/// Content is kept loose: history turns may carry `null` (tool calls) or
/// an array of typed parts, and only the selected user turn is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Value,
}

impl ChatMessage {
    /// Plain text of the message: the string itself, or the `text` parts
    /// joined by newlines. Anything else reads as empty.
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Chat request. Only the latest user message reaches the backend.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Content of the last `user` message.
    pub fn latest_user_query(&self) -> Result<String, ApiError> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(ChatMessage::text)
            .ok_or(ApiError::NoUserMessage)
    }
}

/// Envelope fields shared by a completion and all of its chunks.
#[derive(Debug, Clone)]
pub struct CompletionMeta {
    pub id: String,
    pub created: u64,
    pub model: String,
}

impl CompletionMeta {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", short_id()),
            created: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            model: model.into(),
        }
    }
}

/// Chat completion response (non-streaming).
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: &'static str,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: usize,
    pub message: AssistantMessage,
    pub finish_reason: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AssistantMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatCompletionResponse {
    pub fn new(meta: CompletionMeta, content: String) -> Self {
        Self {
            id: meta.id,
            object: "chat.completion",
            created: meta.created,
            model: meta.model,
            choices: vec![ChatChoice {
                index: 0,
                message: AssistantMessage {
                    role: "assistant",
                    content,
                },
                finish_reason: "stop",
            }],
        }
    }
}

/// Agent discovery response.
#[derive(Debug, Serialize)]
pub struct AgentList {
    pub agents: Vec<AgentDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct AgentDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub provider: AgentProvider,
    pub version: &'static str,
    pub documentation_url: &'static str,
    pub capabilities: AgentCapabilities,
}

#[derive(Debug, Serialize)]
pub struct AgentProvider {
    pub organization: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AgentCapabilities {
    pub streaming: bool,
}

impl AgentDescriptor {
    /// The single agent this gateway fronts.
    pub fn console_agent() -> Self {
        Self {
            name: "Red Hat Console Agent",
            description: "Connects to the Red Hat Console Virtual Assistant API for Red Hat product assistance",
            provider: AgentProvider {
                organization: "Red Hat",
                url: "https://redhat.com",
            },
            version: env!("CARGO_PKG_VERSION"),
            documentation_url: "https://access.redhat.com",
            capabilities: AgentCapabilities { streaming: true },
        }
    }
}

/// First 8 hex characters of a v4 UUID.
fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn discover_agents() -> Json<AgentList> {
    let request_id = short_id();
    info!(request_id = %request_id, "Agent discovery request");

    Json(AgentList {
        agents: vec![AgentDescriptor::console_agent()],
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let request_id = short_id();
    let start = Instant::now();
    let thread_id = headers
        .get(THREAD_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(
        request_id = %request_id,
        thread_id = %thread_id,
        stream = req.stream,
        messages = req.messages.len(),
        "Chat request"
    );

    if state.config.backend.token.is_empty() {
        warn!(request_id = %request_id, "Backend token not configured; backend calls will likely be rejected");
    }

    let query = req.latest_user_query()?;
    debug!(request_id = %request_id, query = %query, "Extracted user query");

    let body = state.backend.send_message(&query).await?;
    let content = normalize(&body)?;

    info!(
        request_id = %request_id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        content_len = content.len(),
        "Backend reply normalized"
    );

    let meta = CompletionMeta::new(state.config.server.model.as_str());
    if req.stream {
        Ok(SseFrames::new(meta, content, request_id).into_response())
    } else {
        Ok(Json(ChatCompletionResponse::new(meta, content)).into_response())
    }
}
