//! sitemap.xml endpoint

use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::error;

use crate::queries::{all_episodes, all_shows};
use crate::services::sitemap::render_sitemap;
use crate::AppState;

/// GET /sitemap.xml
pub async fn sitemap(State(state): State<AppState>) -> Response {
    let cms = state.cms.as_ref();
    let fetched = tokio::try_join!(all_episodes(cms, &state.assets), all_shows(cms, &state.assets));

    match fetched {
        Ok((episodes, shows)) => (
            [
                (CONTENT_TYPE, "application/xml"),
                (CACHE_CONTROL, "max-age=3600"),
            ],
            render_sitemap(&state.config.site_url, &shows, &episodes, Utc::now()),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Error generating sitemap");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error generating sitemap").into_response()
        }
    }
}
