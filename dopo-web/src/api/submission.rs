//! Episode submission form endpoints

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dopo_common::models::ItemId;
use serde_json::json;
use tracing::{error, warn};

use super::service_error;
use crate::cms::FileUpload;
use crate::error::{ApiError, ApiResult, Error};
use crate::services::submission::{
    apply_submission, load_submission_episode, SubmissionEpisode, SubmissionForm, UPDATE_FAILED,
};
use crate::AppState;

/// Uploaded images above this size are refused
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// GET /api/submission/:id
pub async fn submission_episode(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubmissionEpisode>> {
    let id = ItemId::from(id.as_str());
    load_submission_episode(state.cms.as_ref(), &id)
        .await
        .map_err(service_error("load_submission_episode"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Episode not found".to_string()))
}

/// POST /api/submission/:id
pub async fn submit_episode(State(state): State<AppState>, Path(id): Path<String>, multipart: Multipart) -> Response {
    let id = ItemId::from(id.as_str());

    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!(episode_id = %id, error = %e, "Unreadable submission form");
            return ApiError::BadRequest(format!("Invalid form data: {}", e)).into_response();
        }
    };

    let submission = match form.validate() {
        Ok(submission) => submission,
        Err(echo) => return (StatusCode::BAD_REQUEST, Json(echo)).into_response(),
    };

    match apply_submission(state.cms.as_ref(), &id, submission).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(Error::NotFound(_)) => (StatusCode::NOT_FOUND, Json(form.echo("Episode not found"))).into_response(),
        Err(e) => {
            error!(episode_id = %id, error = %e, "Error updating episode");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(form.echo(UPDATE_FAILED))).into_response()
        }
    }
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, axum::extract::multipart::MultipartError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => form.title = Some(field.text().await?),
            Some("description_en") => form.description_en = Some(field.text().await?),
            Some("description_it") => form.description_it = Some(field.text().await?),
            Some("image") => form.image = Some(read_file(field).await?),
            _ => {}
        }
    }

    Ok(form)
}

async fn read_file(field: Field<'_>) -> Result<FileUpload, axum::extract::multipart::MultipartError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?.to_vec();

    Ok(FileUpload {
        file_name,
        content_type,
        bytes,
    })
}
