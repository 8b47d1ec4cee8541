//! Configuration loading
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error. Secrets have no compiled
//! default; features that need them report the gap when invoked.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5780";
pub const DEFAULT_SITE_NAME: &str = "Radio Dopo";
pub const DEFAULT_SITE_URL: &str = "https://radiodopo.it";
pub const DEFAULT_CMS_URL: &str = "https://cms.radiodopo.it";
pub const DEFAULT_MEDIA_URL: &str = "https://media.radiodopo.it";
pub const DEFAULT_MAIL_FROM: &str = "noreply@radiodopo.it";
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REMINDER_HOUR_UTC: u32 = 9;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable names
pub mod env {
    pub const BIND_ADDR: &str = "DOPO_BIND_ADDR";
    pub const LOG_LEVEL: &str = "DOPO_LOG_LEVEL";
    pub const SITE_URL: &str = "PUBLIC_SITE_URL";
    pub const CMS_URL: &str = "DIRECTUS_URL";
    pub const CMS_TOKEN: &str = "DIRECTUS_TOKEN";
    pub const MEDIA_URL: &str = "MEDIA_URL";
    pub const MAILJET_API_KEY: &str = "MAILJET_API_KEY";
    pub const MAILJET_API_SECRET: &str = "MAILJET_API_SECRET";
    pub const MAILJET_FROM_EMAIL: &str = "MAILJET_FROM_EMAIL";
    pub const WEBHOOK_SECRET: &str = "DIRECTUS_WEBHOOK_SECRET";
    pub const CLOUDFLARE_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
    pub const CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
    pub const CALENDAR_API_KEY: &str = "PUBLIC_GOOGLE_CALENDAR_API_KEY";
    pub const CALENDAR_ID: &str = "PUBLIC_GOOGLE_CALENDAR_ID";
    pub const CRON_SECRET: &str = "CRON_SECRET";
}

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailjetToml {
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub from_email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareToml {
    pub zone_id: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarToml {
    pub api_key: Option<String>,
    pub calendar_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsToml {
    pub webhook_secret: Option<String>,
    pub cron_secret: Option<String>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub site_name: Option<String>,
    pub site_url: Option<String>,
    pub cms_url: Option<String>,
    pub cms_token: Option<String>,
    pub media_url: Option<String>,
    pub max_page_size: Option<u32>,
    pub http_timeout_secs: Option<u64>,
    pub scheduler_enabled: Option<bool>,
    pub reminder_hour_utc: Option<u32>,
    pub logging: LoggingConfig,
    pub mailjet: MailjetToml,
    pub cloudflare: CloudflareToml,
    pub calendar: CalendarToml,
    pub secrets: SecretsToml,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the explicit path if given, else the first default location
    /// that exists; `None` when there is nothing to load
    pub fn discover(explicit: Option<&Path>) -> Result<Option<(PathBuf, Self)>> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };
        match path {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok(Some((path, config)))
            }
            None => Ok(None),
        }
    }
}

/// `~/.config/dopo/config.toml`, then `/etc/dopo/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("dopo").join("config.toml"));
    let system_config = PathBuf::from("/etc/dopo/config.toml");

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|path| path.exists())
}

/// Settings supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_addr: Option<String>,
    pub site_url: Option<String>,
    pub log_level: Option<String>,
    pub disable_scheduler: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailjetCredentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub credentials: Option<MailjetCredentials>,
    pub from_email: String,
    pub from_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudflareSettings {
    pub zone_id: String,
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSettings {
    pub api_key: String,
    pub calendar_id: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub bind_addr: String,
    pub site_name: String,
    /// Public origin, no trailing slash
    pub site_url: String,
    pub cms_url: String,
    pub cms_token: Option<String>,
    pub media_url: String,
    pub max_page_size: u32,
    pub http_timeout: Duration,
    pub scheduler_enabled: bool,
    pub reminder_hour_utc: u32,
    pub log_level: String,
    pub mail: MailSettings,
    pub cloudflare: Option<CloudflareSettings>,
    pub calendar: Option<CalendarSettings>,
    pub webhook_secret: Option<String>,
    pub cron_secret: Option<String>,
}

impl SiteConfig {
    /// Resolve from the process environment
    pub fn from_environment(cli: &CliOverrides, file: &TomlConfig) -> Self {
        Self::resolve(cli, file, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve<F>(cli: &CliOverrides, file: &TomlConfig, env_lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = |name: &str| env_lookup(name).filter(|v| is_valid_key(v));
        let pick = |cli: Option<&String>, name: &str, file: Option<&String>| {
            cli.filter(|v| is_valid_key(v))
                .cloned()
                .or_else(|| env_var(name))
                .or_else(|| file.filter(|v| is_valid_key(v)).cloned())
        };

        let mailjet_key = pick(None, env::MAILJET_API_KEY, file.mailjet.api_key.as_ref());
        let mailjet_secret = pick(None, env::MAILJET_API_SECRET, file.mailjet.api_secret.as_ref());
        let credentials = match (mailjet_key, mailjet_secret) {
            (Some(api_key), Some(api_secret)) => Some(MailjetCredentials { api_key, api_secret }),
            _ => None,
        };

        let cloudflare = match (
            pick(None, env::CLOUDFLARE_ZONE_ID, file.cloudflare.zone_id.as_ref()),
            pick(None, env::CLOUDFLARE_API_TOKEN, file.cloudflare.api_token.as_ref()),
        ) {
            (Some(zone_id), Some(api_token)) => Some(CloudflareSettings { zone_id, api_token }),
            _ => None,
        };

        let calendar = match (
            pick(None, env::CALENDAR_API_KEY, file.calendar.api_key.as_ref()),
            pick(None, env::CALENDAR_ID, file.calendar.calendar_id.as_ref()),
        ) {
            (Some(api_key), Some(calendar_id)) => Some(CalendarSettings { api_key, calendar_id }),
            _ => None,
        };

        let site_name = file
            .site_name
            .clone()
            .filter(|v| is_valid_key(v))
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());

        Self {
            bind_addr: pick(cli.bind_addr.as_ref(), env::BIND_ADDR, file.bind_addr.as_ref())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            site_url: trim_origin(
                pick(cli.site_url.as_ref(), env::SITE_URL, file.site_url.as_ref())
                    .unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
            ),
            cms_url: trim_origin(
                pick(None, env::CMS_URL, file.cms_url.as_ref())
                    .unwrap_or_else(|| DEFAULT_CMS_URL.to_string()),
            ),
            cms_token: pick(None, env::CMS_TOKEN, file.cms_token.as_ref()),
            media_url: trim_origin(
                pick(None, env::MEDIA_URL, file.media_url.as_ref())
                    .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string()),
            ),
            max_page_size: file
                .max_page_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_MAX_PAGE_SIZE),
            http_timeout: Duration::from_secs(
                file.http_timeout_secs
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            scheduler_enabled: !cli.disable_scheduler && file.scheduler_enabled.unwrap_or(true),
            reminder_hour_utc: file
                .reminder_hour_utc
                .filter(|hour| *hour < 24)
                .unwrap_or(DEFAULT_REMINDER_HOUR_UTC),
            log_level: pick(cli.log_level.as_ref(), env::LOG_LEVEL, file.logging.level.as_ref())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            mail: MailSettings {
                credentials,
                from_email: pick(None, env::MAILJET_FROM_EMAIL, file.mailjet.from_email.as_ref())
                    .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
                from_name: site_name.clone(),
            },
            site_name,
            cloudflare,
            calendar,
            webhook_secret: pick(None, env::WEBHOOK_SECRET, file.secrets.webhook_secret.as_ref()),
            cron_secret: pick(None, env::CRON_SECRET, file.secrets.cron_secret.as_ref()),
        }
    }
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn trim_origin(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_compiled_defaults() {
        let config = SiteConfig::resolve(&CliOverrides::default(), &TomlConfig::default(), lookup(&[]));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.site_url, DEFAULT_SITE_URL);
        assert_eq!(config.cms_url, DEFAULT_CMS_URL);
        assert_eq!(config.media_url, DEFAULT_MEDIA_URL);
        assert_eq!(config.max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(config.mail.from_email, DEFAULT_MAIL_FROM);
        assert_eq!(config.mail.from_name, DEFAULT_SITE_NAME);
        assert!(config.mail.credentials.is_none());
        assert!(config.cloudflare.is_none());
        assert!(config.webhook_secret.is_none());
        assert!(config.scheduler_enabled);
    }

    #[test]
    fn test_priority_cli_env_file() {
        let file = TomlConfig {
            bind_addr: Some("0.0.0.0:1".into()),
            site_url: Some("https://file.example/".into()),
            cms_url: Some("https://cms.file.example".into()),
            ..Default::default()
        };
        let cli = CliOverrides {
            bind_addr: Some("0.0.0.0:3".into()),
            ..Default::default()
        };
        let config = SiteConfig::resolve(
            &cli,
            &file,
            lookup(&[(env::BIND_ADDR, "0.0.0.0:2"), (env::SITE_URL, "https://env.example/")]),
        );
        assert_eq!(config.bind_addr, "0.0.0.0:3");
        assert_eq!(config.site_url, "https://env.example");
        assert_eq!(config.cms_url, "https://cms.file.example");
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let file = TomlConfig {
            secrets: SecretsToml {
                cron_secret: Some("from-file".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = SiteConfig::resolve(
            &CliOverrides::default(),
            &file,
            lookup(&[(env::CRON_SECRET, "   "), (env::WEBHOOK_SECRET, "")]),
        );
        assert_eq!(config.cron_secret.as_deref(), Some("from-file"));
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn test_paired_settings_need_both_halves() {
        let config = SiteConfig::resolve(
            &CliOverrides::default(),
            &TomlConfig::default(),
            lookup(&[
                (env::CLOUDFLARE_ZONE_ID, "zone"),
                (env::MAILJET_API_KEY, "key"),
                (env::MAILJET_API_SECRET, "secret"),
            ]),
        );
        assert!(config.cloudflare.is_none());
        assert_eq!(
            config.mail.credentials,
            Some(MailjetCredentials {
                api_key: "key".into(),
                api_secret: "secret".into()
            })
        );
    }

    #[test]
    fn test_cli_disables_scheduler() {
        let cli = CliOverrides {
            disable_scheduler: true,
            ..Default::default()
        };
        let config = SiteConfig::resolve(&cli, &TomlConfig::default(), lookup(&[]));
        assert!(!config.scheduler_enabled);
    }
}
