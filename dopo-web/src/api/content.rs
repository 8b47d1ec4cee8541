//! Listing endpoints for shows, episodes and the home singleton

use axum::{
    extract::{Query, State},
    Json,
};
use dopo_common::models::{Episode, Show, SingletonPage};
use serde::{Deserialize, Serialize};

use super::service_error;
use crate::error::ApiResult;
use crate::pagination::{PageWindow, DEFAULT_LIMIT};
use crate::{queries, AppState};

/// `?limit&offset&search`
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

impl ListParams {
    fn window(&self, state: &AppState) -> PageWindow {
        PageWindow::clamped(self.limit, self.offset, state.config.max_page_size)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowsResponse {
    pub shows: Vec<Show>,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesResponse {
    pub episodes: Vec<Episode>,
    pub has_more: bool,
}

/// GET /api/shows
pub async fn list_shows(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Json<ShowsResponse>> {
    let window = params.window(&state);
    let shows = queries::list_shows(state.cms.as_ref(), &state.assets, window, params.search.as_deref())
        .await
        .map_err(service_error("list_shows"))?;

    Ok(Json(ShowsResponse {
        has_more: window.has_more(shows.len()),
        shows,
    }))
}

/// GET /api/episodes
pub async fn list_episodes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<EpisodesResponse>> {
    let window = params.window(&state);
    let episodes = queries::list_episodes(state.cms.as_ref(), &state.assets, window, params.search.as_deref())
        .await
        .map_err(service_error("list_episodes"))?;

    Ok(Json(EpisodesResponse {
        has_more: window.has_more(episodes.len()),
        episodes,
    }))
}

/// GET /api/home
///
/// `null` when the singleton has never been saved.
pub async fn home(State(state): State<AppState>) -> ApiResult<Json<Option<SingletonPage>>> {
    let home = queries::home_content(state.cms.as_ref())
        .await
        .map_err(service_error("home_content"))?;
    Ok(Json(home))
}
