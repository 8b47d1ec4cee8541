//! dopo-web library - Radio Dopo site service
//!
//! Read-only content API over the CMS, plus the few write paths the site
//! owns: episode submissions, host reminders and CDN purges.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use dopo_common::config::SiteConfig;
use dopo_common::AssetUrlBuilder;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cms;
pub mod error;
pub mod pagination;
pub mod queries;
pub mod scheduler;
pub mod services;

pub use error::{ApiError, Error, Result};

use cms::{ContentStore, DirectusClient};
use services::{CachePurger, CalendarSource, CloudflarePurger, EmailSender, GoogleCalendar, MailjetSender};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    /// CMS access
    pub cms: Arc<dyn ContentStore>,
    pub assets: AssetUrlBuilder,
    pub mailer: Arc<dyn EmailSender>,
    pub purger: Arc<dyn CachePurger>,
    pub calendar: Arc<dyn CalendarSource>,
}

impl AppState {
    /// Create application state from explicit collaborators
    pub fn new(
        config: SiteConfig,
        cms: Arc<dyn ContentStore>,
        mailer: Arc<dyn EmailSender>,
        purger: Arc<dyn CachePurger>,
        calendar: Arc<dyn CalendarSource>,
    ) -> Self {
        let assets = AssetUrlBuilder::new(config.cms_url.clone(), config.media_url.clone());
        Self {
            config: Arc::new(config),
            cms,
            assets,
            mailer,
            purger,
            calendar,
        }
    }

    /// Create application state backed by the real external services
    pub fn from_config(config: SiteConfig) -> Result<Self> {
        let timeout = config.http_timeout;
        let cms = DirectusClient::new(&config.cms_url, config.cms_token.clone(), timeout)?;
        let mailer = MailjetSender::new(config.mail.clone(), timeout)?;
        let purger = CloudflarePurger::new(config.cloudflare.clone(), timeout)?;
        let calendar = GoogleCalendar::new(config.calendar.clone(), timeout)?;

        Ok(Self::new(
            config,
            Arc::new(cms),
            Arc::new(mailer),
            Arc::new(purger),
            Arc::new(calendar),
        ))
    }
}

/// Build application router
///
/// Public routes need no credentials. The reminder trigger and the CMS
/// webhook each sit behind their own shared-secret middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let reminders = Router::new()
        .route("/api/send-episode-reminders", post(api::send_episode_reminders))
        .route_layer(middleware::from_fn_with_state(state.clone(), api::require_cron_secret));

    let webhook = Router::new()
        .route("/api/webhook/purge-cache", post(api::purge_cache))
        .route_layer(middleware::from_fn_with_state(state.clone(), api::require_webhook_secret));

    let submission = Router::new()
        .route(
            "/api/submission/:id",
            get(api::submission_episode).post(api::submit_episode),
        )
        .layer(DefaultBodyLimit::max(api::submission::MAX_UPLOAD_BYTES));

    let public = Router::new()
        .route("/api/shows", get(api::list_shows))
        .route("/api/episodes", get(api::list_episodes))
        .route("/api/home", get(api::home))
        .route("/api/schedule", get(api::weekly_schedule))
        .route("/api/pages/landing", get(api::pages::landing))
        .route("/api/pages/shows/:slug", get(api::pages::show))
        .route("/api/pages/episodes/:slug", get(api::pages::episode))
        .route("/api/pages/about", get(api::pages::about))
        .route("/api/pages/partners", get(api::pages::partners))
        .route("/sitemap.xml", get(api::sitemap))
        .merge(api::health_routes());

    Router::new()
        .merge(reminders)
        .merge(webhook)
        .merge(submission)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
