//! Weekly broadcast schedule from the public calendar
//!
//! The calendar provider is a black box reached through [`CalendarSource`];
//! [`build_schedule`] turns its events into the slots the schedule page
//! shows and picks the one on air.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dopo_common::config::CalendarSettings;
use dopo_common::models::{CalendarEvent, Playlist};
use dopo_common::time::{end_of_day, parse_cms_datetime, start_of_day, to_iso_millis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";
const CALENDAR_SERVICE: &str = "Google Calendar";
const MAX_RESULTS: &str = "100";
const UNTITLED_SHOW: &str = "Untitled Show";

/// Days after today covered by the schedule
pub const SCHEDULE_DAYS: i64 = 7;

/// Provider event list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarFeed {
    #[serde(default)]
    pub items: Vec<FeedEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
}

/// Timed events carry `dateTime`, all-day events only `date`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventTime {
    #[serde(default, rename = "dateTime")]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl EventTime {
    fn instant(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .and_then(parse_cms_datetime)
    }
}

/// Schedule endpoint body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub data: Vec<CalendarEvent>,
    pub live_now: Option<CalendarEvent>,
}

/// Today 00:00 UTC through the end of the seventh day after it
pub fn schedule_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day(now), end_of_day(now + Duration::days(SCHEDULE_DAYS)))
}

/// Map provider events to slots; the last slot spanning `now` is live
pub fn build_schedule(feed: CalendarFeed, now: DateTime<Utc>) -> Schedule {
    let mut data = Vec::with_capacity(feed.items.len());
    let mut live_now = None;

    for item in feed.items {
        let (Some(start), Some(end)) = (
            item.start.as_ref().and_then(EventTime::instant),
            item.end.as_ref().and_then(EventTime::instant),
        ) else {
            warn!(summary = ?item.summary, "Skipping calendar event without a readable time");
            continue;
        };

        let title = item
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNTITLED_SHOW.to_string());
        let event = CalendarEvent {
            start,
            end,
            playlist: Playlist {
                title: title.clone(),
                name: title,
            },
            description: item.description.unwrap_or_default(),
        };

        if start <= now && end >= now {
            live_now = Some(event.clone());
        }
        data.push(event);
    }

    Schedule { data, live_now }
}

#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Single (expanded) events overlapping `[from, to]`, by start time
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<CalendarFeed>;
}

/// Google Calendar events API with an API key
pub struct GoogleCalendar {
    http_client: reqwest::Client,
    settings: Option<CalendarSettings>,
    api_base: String,
}

impl GoogleCalendar {
    pub fn new(settings: Option<CalendarSettings>, timeout: std::time::Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
            api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| Error::Config(format!("Calendar API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("Calendar API base cannot hold a path".to_string()))?
            .push(calendar_id)
            .push("events");
        Ok(url)
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendar {
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<CalendarFeed> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| Error::Config("Missing required environment variables".to_string()))?;

        let url = self.events_url(&settings.calendar_id)?;
        debug!(from = %from, to = %to, "Fetching calendar events");

        let response = self
            .http_client
            .get(url)
            .query(&[
                ("key", settings.api_key.as_str()),
                ("timeMin", to_iso_millis(from).as_str()),
                ("timeMax", to_iso_millis(to).as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", MAX_RESULTS),
            ])
            .send()
            .await
            .map_err(Error::transport(CALENDAR_SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                service: CALENDAR_SERVICE,
                status: status.as_u16(),
                message: format!("Failed to fetch calendar: {}", body.trim()),
            });
        }

        response.json().await.map_err(|e| Error::decode(CALENDAR_SERVICE, e))
    }
}
