//! The upstream conversational service.
//!
//! - [`client`]: HTTP client issuing one POST per query
//! - [`reply`]: Flattening of the backend reply into a single content string

pub mod client;
pub mod reply;

pub use client::{Backend, BackendError, ConsoleClient};
pub use reply::{normalize, NormalizeError};
