//! Static shared-secret bearer authentication.
//!
//! Every protected route runs [`require_bearer`] before its handler, so a
//! rejected caller never reaches request parsing or the backend.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;
use tracing::warn;

use crate::server::error::ApiError;
use crate::server::openai_api::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Why a credential was refused. All variants are equally unauthorized;
/// the distinction only feeds the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    Missing,
    #[error("Authorization header must start with 'Bearer '")]
    MalformedPrefix,
    #[error("Invalid bearer token")]
    InvalidToken,
}

/// Validates `Authorization` header values against the configured secret.
#[derive(Clone)]
pub struct BearerAuth {
    token: Arc<str>,
}

impl BearerAuth {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Check a raw header value. `None` or an empty value means the header was absent.
    pub fn verify(&self, header: Option<&str>) -> Result<(), AuthError> {
        let header = header
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::Missing)?;
        let presented = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AuthError::MalformedPrefix)?;

        if presented == &*self.token {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Axum middleware rejecting requests without the configured bearer token.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let verdict = match request.headers().get(AUTHORIZATION).map(|value| value.to_str()) {
        // Not visible ASCII, so it cannot carry our prefix.
        Some(Err(_)) => Err(AuthError::MalformedPrefix),
        Some(Ok(value)) => state.auth.verify(Some(value)),
        None => state.auth.verify(None),
    };

    if let Err(e) = verdict {
        warn!(path = %request.uri().path(), reason = %e, "Rejected unauthenticated request");
        return Err(ApiError::Unauthorized(e));
    }

    Ok(next.run(request).await)
}
