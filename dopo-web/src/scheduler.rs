//! Daily reminder trigger
//!
//! Runs inside the service process. Once a day at the configured UTC hour
//! it POSTs to the site's own reminder endpoint, exactly as an external
//! cron would, so the endpoint's secret check applies to it too.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use dopo_common::config::SiteConfig;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Error, Result};

const SCHEDULER_SERVICE: &str = "Reminder endpoint";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    #[serde(default)]
    total_episodes: usize,
    #[serde(default)]
    emails_sent: usize,
}

/// Next `hour:00:00` UTC strictly after `now`
pub fn next_run_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Spawn the daily loop; it runs until the process exits
pub fn spawn_daily_reminders(config: Arc<SiteConfig>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let http_client = match reqwest::Client::builder().timeout(config.http_timeout).build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Reminder scheduler disabled, HTTP client unavailable");
                return;
            }
        };

        loop {
            let now = Utc::now();
            let next = next_run_after(now, config.reminder_hour_utc);
            info!(next_run = %next, "Reminder run scheduled");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match trigger_reminders(&http_client, &config).await {
                Ok(summary) => info!(
                    sent = summary.emails_sent,
                    total = summary.total_episodes,
                    "Scheduled reminder run finished"
                ),
                Err(e) => error!(error = %e, "Scheduled reminder run failed"),
            }
        }
    })
}

async fn trigger_reminders(http_client: &reqwest::Client, config: &SiteConfig) -> Result<RunSummary> {
    let url = format!("{}/api/send-episode-reminders", config.site_url);
    let mut request = http_client.post(&url);
    if let Some(secret) = &config.cron_secret {
        request = request.bearer_auth(secret);
    }

    let response = request.send().await.map_err(Error::transport(SCHEDULER_SERVICE))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Upstream {
            service: SCHEDULER_SERVICE,
            status: status.as_u16(),
            message: body,
        });
    }

    response.json().await.map_err(|e| Error::decode(SCHEDULER_SERVICE, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 6, 15, 0).unwrap();
        assert_eq!(next_run_after(now, 9), Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_tomorrow_once_passed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 9, 0, 0).unwrap();
        assert_eq!(next_run_after(now, 9), Utc.with_ymd_and_hms(2025, 3, 8, 9, 0, 0).unwrap());

        let now = Utc.with_ymd_and_hms(2025, 12, 31, 22, 0, 0).unwrap();
        assert_eq!(next_run_after(now, 9), Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_out_of_range_hour_is_capped() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 0, 0, 0).unwrap();
        assert_eq!(next_run_after(now, 99), Utc.with_ymd_and_hms(2025, 3, 7, 23, 0, 0).unwrap());
    }
}
