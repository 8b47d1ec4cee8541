//! Episode reminder dispatch
//!
//! Finds episodes starting exactly [`REMINDER_LEAD_DAYS`] days from now and
//! asks each show's host for the episode details. Episodes are processed
//! one at a time; a failure is recorded against its episode and the batch
//! carries on.

use chrono::{DateTime, Duration, Utc};
use dopo_common::models::{ItemId, RawEpisode, ShowLink, STATUS_ARCHIVED};
use dopo_common::time::{end_of_day, format_long_date, parse_cms_datetime, start_of_day, to_iso_millis};
use dopo_common::{Filter, ItemQuery};
use serde::Serialize;
use tracing::{info, warn};

use super::email::{EmailSender, ShowInfoRequest};
use crate::cms::{decode_all, ContentStore};
use crate::error::Result;
use crate::queries::episodes::EPISODES;

/// How far ahead hosts are reminded
pub const REMINDER_LEAD_DAYS: i64 = 14;

pub const NO_EMAIL_REASON: &str = "No email configured for show";

const UNTITLED_EPISODE: &str = "Untitled Episode";

const REMINDER_FIELDS: [&str; 7] = [
    "id",
    "title",
    "start",
    "show_id.id",
    "show_id.name",
    "show_id.slug",
    "show_id.email",
];

/// UTC day `REMINDER_LEAD_DAYS` after `now`, first to last millisecond
pub fn reminder_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let target = now + Duration::days(REMINDER_LEAD_DAYS);
    (start_of_day(target), end_of_day(target))
}

pub fn reminder_query(now: DateTime<Utc>) -> ItemQuery {
    let (from, to) = reminder_window(now);
    ItemQuery::new().fields(REMINDER_FIELDS).filter(
        Filter::between("start", to_iso_millis(from), to_iso_millis(to))
            .and(Filter::neq("status", STATUS_ARCHIVED)),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentReminder {
    pub episode_id: ItemId,
    pub show_name: Option<String>,
    pub email: String,
    pub sent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFailure {
    pub episode_id: ItemId,
    pub error: String,
    pub show_name: Option<String>,
}

/// What happened to one episode
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderOutcome {
    Sent(SentReminder),
    /// Show has no contact address
    Skipped(ReminderFailure),
    /// Delivery was attempted and failed
    Failed(ReminderFailure),
}

/// Batch summary returned by the reminder endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    pub success: bool,
    pub total_episodes: usize,
    pub emails_sent: usize,
    pub results: Vec<SentReminder>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ReminderFailure>,
}

impl ReminderReport {
    pub fn from_outcomes(total_episodes: usize, outcomes: Vec<ReminderOutcome>) -> Self {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                ReminderOutcome::Sent(sent) => results.push(sent),
                ReminderOutcome::Skipped(failure) | ReminderOutcome::Failed(failure) => errors.push(failure),
            }
        }

        Self {
            success: true,
            total_episodes,
            emails_sent: results.len(),
            results,
            errors,
        }
    }
}

/// Sends show info requests for upcoming episodes
pub struct ReminderDispatcher<'a> {
    cms: &'a dyn ContentStore,
    mailer: &'a dyn EmailSender,
    base_url: &'a str,
}

impl<'a> ReminderDispatcher<'a> {
    pub fn new(cms: &'a dyn ContentStore, mailer: &'a dyn EmailSender, base_url: &'a str) -> Self {
        Self { cms, mailer, base_url }
    }

    /// Remind every episode in the window; the CMS read failing fails the run
    pub async fn dispatch(&self, now: DateTime<Utc>) -> Result<ReminderReport> {
        let episodes: Vec<RawEpisode> = decode_all(self.cms.read_items(EPISODES, &reminder_query(now)).await?)?;
        info!(count = episodes.len(), "Episodes due for reminders");

        let mut outcomes = Vec::with_capacity(episodes.len());
        for episode in &episodes {
            outcomes.push(self.remind(episode).await);
        }

        let report = ReminderReport::from_outcomes(episodes.len(), outcomes);
        info!(
            total = report.total_episodes,
            sent = report.emails_sent,
            failed = report.errors.len(),
            "Reminder run complete"
        );
        Ok(report)
    }

    async fn remind(&self, episode: &RawEpisode) -> ReminderOutcome {
        let show = match &episode.show_id {
            Some(ShowLink::Record(show)) => Some(show.as_ref()),
            _ => None,
        };
        let show_name = show.and_then(|s| s.name.clone());

        let Some(email) = show.and_then(|s| s.email.clone()).filter(|e| !e.trim().is_empty()) else {
            warn!(episode_id = %episode.id, "Skipping reminder, show has no email");
            return ReminderOutcome::Skipped(ReminderFailure {
                episode_id: episode.id.clone(),
                error: NO_EMAIL_REASON.to_string(),
                show_name,
            });
        };

        let request = ShowInfoRequest {
            to: email.clone(),
            show_name: show_name.clone().unwrap_or_default(),
            episode_title: episode
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED_EPISODE.to_string()),
            episode_date: display_date(episode.start.as_deref()),
            episode_id: episode.id.to_string(),
            base_url: self.base_url.to_string(),
        };

        match self.mailer.send_show_info_request(&request).await {
            Ok(()) => ReminderOutcome::Sent(SentReminder {
                episode_id: episode.id.clone(),
                show_name,
                email,
                sent: true,
            }),
            Err(e) => {
                warn!(episode_id = %episode.id, error = %e, "Failed to send reminder");
                ReminderOutcome::Failed(ReminderFailure {
                    episode_id: episode.id.clone(),
                    error: e.to_string(),
                    show_name,
                })
            }
        }
    }
}

fn display_date(start: Option<&str>) -> String {
    match start {
        Some(raw) => parse_cms_datetime(raw)
            .map(format_long_date)
            .unwrap_or_else(|| raw.to_string()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_window_is_whole_utc_day_two_weeks_out() {
        let now = Utc.with_ymd_and_hms(2025, 2, 21, 17, 45, 0).unwrap();
        let (from, to) = reminder_window(now);
        assert_eq!(to_iso_millis(from), "2025-03-07T00:00:00.000Z");
        assert_eq!(to_iso_millis(to), "2025-03-07T23:59:59.999Z");
    }

    #[test]
    fn test_query_excludes_archived() {
        let now = Utc.with_ymd_and_hms(2025, 2, 21, 9, 0, 0).unwrap();
        let query = reminder_query(now);
        let filter = query.filter.unwrap();
        assert_eq!(
            filter.to_json(),
            json!({"_and": [
                {"start": {"_between": ["2025-03-07T00:00:00.000Z", "2025-03-07T23:59:59.999Z"]}},
                {"status": {"_neq": "archived"}}
            ]})
        );
        assert!(query.fields.contains(&"show_id.email".to_string()));
    }

    #[test]
    fn test_report_omits_empty_errors() {
        let report = ReminderReport::from_outcomes(0, Vec::new());
        let out = serde_json::to_value(&report).unwrap();
        assert_eq!(out, json!({"success": true, "totalEpisodes": 0, "emailsSent": 0, "results": []}));
    }

    #[test]
    fn test_report_splits_outcomes() {
        let report = ReminderReport::from_outcomes(
            2,
            vec![
                ReminderOutcome::Skipped(ReminderFailure {
                    episode_id: ItemId::Int(1),
                    error: NO_EMAIL_REASON.into(),
                    show_name: Some("A".into()),
                }),
                ReminderOutcome::Sent(SentReminder {
                    episode_id: ItemId::Int(2),
                    show_name: Some("B".into()),
                    email: "b@example.org".into(),
                    sent: true,
                }),
            ],
        );
        let out = serde_json::to_value(&report).unwrap();
        assert_eq!(out["emailsSent"], 1);
        assert_eq!(out["results"][0]["episodeId"], 2);
        assert_eq!(out["errors"][0]["episodeId"], 1);
        assert_eq!(out["errors"][0]["error"], NO_EMAIL_REASON);
        assert_eq!(out["errors"][0]["showName"], "A");
    }

    #[test]
    fn test_display_date() {
        assert_eq!(display_date(Some("2025-03-07T21:00:00")), "March 7, 2025");
        assert_eq!(display_date(Some("soon")), "soon");
        assert_eq!(display_date(None), "");
    }
}
