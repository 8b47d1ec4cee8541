//! CMS change webhook
//!
//! Guarded by [`super::require_webhook_secret`]; by the time the handler
//! runs the caller is authenticated and the purger is configured.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use dopo_common::time::to_iso_millis;
use serde_json::json;
use tracing::{error, info};

use crate::services::purge::{urls_to_purge, ChangeNotification};
use crate::AppState;

/// POST /api/webhook/purge-cache
pub async fn purge_cache(State(state): State<AppState>, body: Bytes) -> Response {
    let notification: ChangeNotification = match serde_json::from_slice(&body) {
        Ok(notification) => notification,
        Err(e) => return internal_error(e),
    };

    let collection = notification.collection.clone().unwrap_or_default();
    info!(
        collection = %collection,
        keys = ?notification.keys,
        event = ?notification.event,
        "Webhook received"
    );

    let urls = urls_to_purge(&state.config.site_url, &collection, &notification.key_segments());
    info!(urls = ?urls, "Purging URLs");

    match state.purger.purge(&urls).await {
        Ok(outcome) if outcome.success => Json(json!({
            "success": true,
            "purged": urls,
            "collection": notification.collection,
            "event": notification.event,
            "timestamp": to_iso_millis(Utc::now()),
        }))
        .into_response(),
        Ok(outcome) => {
            error!(details = %outcome.details, "Cloudflare cache purge failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Cache purge failed",
                    "details": outcome.details,
                })),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

fn internal_error(e: impl std::fmt::Display) -> Response {
    error!(error = %e, "Webhook error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal server error",
            "message": e.to_string(),
        })),
    )
        .into_response()
}
