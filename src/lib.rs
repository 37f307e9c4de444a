//! console-agent-gateway: an OpenAI-style front for the Red Hat Console
//! virtual assistant.
//!
//! Accepts chat requests, forwards the latest user message to the backend
//! talk API, flattens its reply into one content string, and answers either
//! with a chat completion or an emulated SSE stream.

pub mod auth;
pub mod backend;
pub mod config;
pub mod server;
