//! HTTP server providing an OpenAI-style chat API.
//!
//! - [`openai_api`]: Request/response types and route handlers
//! - [`streaming`]: SSE emulation for clients that ask for `stream: true`
//! - [`error`]: Error-to-response mapping

pub mod error;
pub mod openai_api;
pub mod streaming;
