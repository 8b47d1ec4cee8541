//! HTTP API handlers for dopo-web

pub mod auth;
pub mod content;
pub mod health;
pub mod language;
pub mod pages;
pub mod reminders;
pub mod schedule;
pub mod sitemap;
pub mod submission;
pub mod webhook;

pub use auth::{require_cron_secret, require_webhook_secret};
pub use content::{home, list_episodes, list_shows};
pub use health::health_routes;
pub use language::PreferredLanguage;
pub use reminders::send_episode_reminders;
pub use schedule::weekly_schedule;
pub use sitemap::sitemap;
pub use submission::{submission_episode, submit_episode};
pub use webhook::purge_cache;

use tracing::error;

use crate::error::{ApiError, Error};

/// Log a failed operation and convert it for the response
pub(crate) fn service_error(operation: &'static str) -> impl FnOnce(Error) -> ApiError {
    move |e| {
        error!(operation = %operation, error = %e, "Request failed");
        ApiError::from(e)
    }
}
