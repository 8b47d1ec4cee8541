//! Reminder trigger endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::error;

use crate::error::{ApiError, ApiResult};
use crate::services::reminders::{ReminderDispatcher, ReminderReport};
use crate::AppState;

/// POST /api/send-episode-reminders
///
/// Called by the in-process scheduler or an external cron; guarded by
/// [`super::require_cron_secret`].
pub async fn send_episode_reminders(State(state): State<AppState>) -> ApiResult<Json<ReminderReport>> {
    let dispatcher = ReminderDispatcher::new(state.cms.as_ref(), state.mailer.as_ref(), &state.config.site_url);

    let report = dispatcher.dispatch(Utc::now()).await.map_err(|e| {
        error!(error = %e, "Error in send-episode-reminders");
        ApiError::Internal(format!("Failed to process reminders: {}", e))
    })?;
    Ok(Json(report))
}
