//! Page data endpoints
//!
//! One endpoint per public page, returning everything the page template
//! renders, with SEO fields already resolved for the visitor's language.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{service_error, PreferredLanguage};
use crate::error::{ApiError, ApiResult};
use crate::queries::pages::{
    about_page_data, episode_page, landing_page, partners_page_data, show_page, AboutPage, EpisodePage, LandingPage,
    PartnersPage, ShowPage,
};
use crate::AppState;

/// GET /api/pages/landing
pub async fn landing(State(state): State<AppState>) -> ApiResult<Json<LandingPage>> {
    let page = landing_page(state.cms.as_ref(), &state.assets, &state.config.site_name)
        .await
        .map_err(service_error("landing_page"))?;
    Ok(Json(page))
}

/// GET /api/pages/shows/:slug
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    PreferredLanguage(language): PreferredLanguage,
) -> ApiResult<Json<ShowPage>> {
    show_page(state.cms.as_ref(), &state.assets, &slug, language, &state.config.site_name)
        .await
        .map_err(service_error("show_page"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Show not found".to_string()))
}

/// GET /api/pages/episodes/:slug
pub async fn episode(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    PreferredLanguage(language): PreferredLanguage,
) -> ApiResult<Json<EpisodePage>> {
    episode_page(state.cms.as_ref(), &state.assets, &slug, language, &state.config.site_name)
        .await
        .map_err(service_error("episode_page"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Episode not found".to_string()))
}

/// GET /api/pages/about
pub async fn about(
    State(state): State<AppState>,
    PreferredLanguage(language): PreferredLanguage,
) -> ApiResult<Json<AboutPage>> {
    let page = about_page_data(state.cms.as_ref(), language, &state.config.site_name)
        .await
        .map_err(service_error("about_page"))?;
    Ok(Json(page))
}

/// GET /api/pages/partners
pub async fn partners(State(state): State<AppState>) -> ApiResult<Json<PartnersPage>> {
    let page = partners_page_data(state.cms.as_ref(), &state.config.site_name)
        .await
        .map_err(service_error("partners_page"))?;
    Ok(Json(page))
}
