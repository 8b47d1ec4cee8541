//! Error types for dopo-web
//!
//! [`Error`] is what services and clients return. [`ApiError`] is the HTTP
//! face of it: every variant renders as `{"error": message}` with the
//! matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Service-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream service could not be reached
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream service answered with a non-success status
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Upstream body did not have the expected shape
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Required setting missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// dopo-common error
    #[error(transparent)]
    Common(#[from] dopo_common::Error),
}

impl Error {
    pub fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Error {
        move |source| Error::Transport { service, source }
    }

    pub fn decode(service: &'static str, message: impl std::fmt::Display) -> Error {
        Error::Decode {
            service,
            message: message.to_string(),
        }
    }
}

/// Result type for services
pub type Result<T> = std::result::Result<T, Error>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or wrong shared secret (401)
    #[error("Unauthorized")]
    Unauthorized,

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),

    /// Service failure, mapped by kind
    #[error(transparent)]
    Service(#[from] Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Service(Error::NotFound(msg)) => (StatusCode::NOT_FOUND, msg),
            ApiError::Service(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
