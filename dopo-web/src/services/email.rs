//! Transactional email
//!
//! **Show info request:** sent to a show's contact address ahead of an
//! episode, linking to the submission form for that episode.

use async_trait::async_trait;
use dopo_common::config::MailSettings;
use maud::{html, Markup, DOCTYPE};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::error::{Error, Result};

const MAILJET_SEND_URL: &str = "https://api.mailjet.com/v3.1/send";
const MAILJET_SERVICE: &str = "Mailjet";

/// Everything the show info request email needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowInfoRequest {
    pub to: String,
    pub show_name: String,
    pub episode_title: String,
    /// Already formatted for display, e.g. `March 7, 2025`
    pub episode_date: String,
    pub episode_id: String,
    /// Public site origin, no trailing slash
    pub base_url: String,
}

impl ShowInfoRequest {
    pub fn form_url(&self) -> String {
        format!("{}/submission/{}", self.base_url, self.episode_id)
    }

    pub fn subject(&self) -> String {
        format!("Episode Info Needed: {} - {}", self.show_name, self.episode_date)
    }

    pub fn render_html(&self, station_name: &str) -> String {
        self.markup(station_name).into_string()
    }

    fn markup(&self, station_name: &str) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    title { (self.subject()) }
                }
                body style="font-family: Helvetica, Arial, sans-serif; color: #111; line-height: 1.5;" {
                    h1 style="font-size: 20px;" { "Episode info needed" }
                    p { "Hi " (self.show_name) "," }
                    p {
                        "Your episode " strong { (self.episode_title) }
                        " airs on " strong { (self.episode_date) } "."
                    }
                    p {
                        "Please send us the episode title, a short description in English "
                        "and/or Italian, and an image, so we can publish it on time."
                    }
                    p {
                        a href=(self.form_url())
                            style="display: inline-block; padding: 10px 16px; background: #111; color: #fff; text-decoration: none;" {
                            "Submit episode info"
                        }
                    }
                    p style="font-size: 12px; color: #666;" {
                        "If the button does not work, open this link: " (self.form_url())
                    }
                    p { "Thanks," br; (station_name) }
                }
            }
        }
    }
}

/// Outbound email delivery
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_show_info_request(&self, request: &ShowInfoRequest) -> Result<()>;
}

/// Mailjet Send API v3.1 client
pub struct MailjetSender {
    http_client: reqwest::Client,
    settings: MailSettings,
    endpoint: String,
}

impl MailjetSender {
    pub fn new(settings: MailSettings, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
            endpoint: MAILJET_SEND_URL.to_string(),
        })
    }

    /// Request body for one message
    pub fn payload(&self, request: &ShowInfoRequest) -> serde_json::Value {
        json!({
            "Messages": [{
                "From": {
                    "Email": self.settings.from_email,
                    "Name": self.settings.from_name,
                },
                "To": [{ "Email": request.to }],
                "Subject": request.subject(),
                "HTMLPart": request.render_html(&self.settings.from_name),
            }]
        })
    }
}

#[async_trait]
impl EmailSender for MailjetSender {
    async fn send_show_info_request(&self, request: &ShowInfoRequest) -> Result<()> {
        let credentials = self
            .settings
            .credentials
            .as_ref()
            .ok_or_else(|| Error::Config("Mailjet API credentials not configured".to_string()))?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .json(&self.payload(request))
            .send()
            .await
            .map_err(Error::transport(MAILJET_SERVICE))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                service: MAILJET_SERVICE,
                status: status.as_u16(),
                message: format!("Email sending failed: {}", body.trim()),
            });
        }

        info!(to = %request.to, episode_id = %request.episode_id, "Show info request sent");
        Ok(())
    }
}
