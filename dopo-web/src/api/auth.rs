//! Shared-secret middleware for machine-to-machine endpoints
//!
//! Both secrets travel as `Authorization: Bearer <secret>`. The check runs
//! before the handler, so a rejected request never reaches the CMS.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Whether the request carries `Bearer {secret}`
pub fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret)
}

/// Reminder trigger guard
///
/// The cron secret is optional: without one configured, every caller is
/// accepted.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(secret) = &state.config.cron_secret {
        if !bearer_matches(request.headers(), secret) {
            warn!(path = %request.uri().path(), "Rejected reminder trigger with bad secret");
            return Err(AuthError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// CMS webhook guard
///
/// Unlike the cron secret this one is mandatory, and the purge credentials
/// must be present before any caller is considered.
pub async fn require_webhook_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(secret) = state.config.webhook_secret.as_deref().filter(|s| !s.is_empty()) else {
        return Err(AuthError::MissingConfiguration);
    };
    if !state.purger.is_configured() {
        return Err(AuthError::MissingConfiguration);
    }

    if !bearer_matches(request.headers(), secret) {
        warn!("Unauthorized webhook attempt");
        return Err(AuthError::Unauthorized);
    }
    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum AuthError {
    Unauthorized,
    MissingConfiguration,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
            }
            AuthError::MissingConfiguration => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "message": "Missing required environment variables",
                })),
            )
                .into_response(),
        }
    }
}
