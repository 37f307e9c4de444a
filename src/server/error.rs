//! HTTP-facing error taxonomy.
//!
//! Each failure maps to one status code and a `{"detail": "..."}` body.

use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::backend::{BackendError, NormalizeError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed or incorrect credential.
    #[error("{0}")]
    Unauthorized(AuthError),

    /// The request carried no `user` message.
    #[error("No user message found")]
    NoUserMessage,

    /// Network failure or non-200 reply from the backend.
    #[error("Failed to get response from backend")]
    BackendUnavailable(#[source] BackendError),

    /// The backend body was not JSON.
    #[error("Invalid response from backend")]
    InvalidBackendResponse(#[source] NormalizeError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NoUserMessage => StatusCode::BAD_REQUEST,
            Self::BackendUnavailable(_) | Self::InvalidBackendResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Unauthorized(e)
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        Self::BackendUnavailable(e)
    }
}

impl From<NormalizeError> for ApiError {
    fn from(e: NormalizeError) -> Self {
        Self::InvalidBackendResponse(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorBody {
            detail: self.to_string(),
        });

        let mut response = (status, body).into_response();
        if let Self::Unauthorized(_) = self {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized(AuthError::Missing).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NoUserMessage.status_code(), StatusCode::BAD_REQUEST);

        let parse_err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert_eq!(
            ApiError::from(NormalizeError::from(parse_err)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = ApiError::Unauthorized(AuthError::InvalidToken).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn test_messages_are_distinct_per_auth_failure() {
        let messages: Vec<String> = [
            AuthError::Missing,
            AuthError::MalformedPrefix,
            AuthError::InvalidToken,
        ]
        .into_iter()
        .map(|e| ApiError::Unauthorized(e).to_string())
        .collect();

        assert_eq!(messages[0], "Authorization header required");
        assert_eq!(messages[1], "Authorization header must start with 'Bearer '");
        assert_eq!(messages[2], "Invalid bearer token");
    }
}
