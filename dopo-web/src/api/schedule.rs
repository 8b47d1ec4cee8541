//! Weekly schedule endpoint

use axum::{
    extract::State,
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::services::calendar::{build_schedule, schedule_window};
use crate::AppState;

/// GET /api/schedule
pub async fn weekly_schedule(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let (from, to) = schedule_window(now);

    match state.calendar.events_between(from, to).await {
        Ok(feed) => (
            [(CACHE_CONTROL, "public, max-age=60")],
            Json(build_schedule(feed, now)),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Error fetching calendar");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch calendar data",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
