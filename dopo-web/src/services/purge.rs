//! CDN cache invalidation
//!
//! A CMS change notification names a collection and the affected keys;
//! [`urls_to_purge`] maps that to the public pages rendering it and a
//! [`CachePurger`] asks the CDN to drop them.

use async_trait::async_trait;
use dopo_common::config::CloudflareSettings;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Error, Result};

const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";
const CLOUDFLARE_SERVICE: &str = "Cloudflare";

/// Change notification posted by the CMS
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeNotification {
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub keys: Option<Vec<Value>>,
    #[serde(default)]
    pub event: Option<Value>,
}

impl ChangeNotification {
    /// Keys as URL path segments; numbers and strings are accepted
    pub fn key_segments(&self) -> Vec<String> {
        self.keys
            .iter()
            .flatten()
            .filter_map(|key| match key {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// Public URLs affected by a change, deduplicated in insertion order
///
/// The site root is always included.
pub fn urls_to_purge(site_url: &str, collection: &str, keys: &[String]) -> Vec<String> {
    let base = site_url.trim_end_matches('/');
    let mut urls = vec![format!("{}/", base)];

    let mut section = |path: &str, with_keys: bool| {
        urls.push(format!("{}/{}", base, path));
        if with_keys {
            urls.extend(keys.iter().map(|key| format!("{}/{}/{}", base, path, key)));
        }
    };

    match collection {
        "shows" => section("shows", true),
        "episodes" => section("episodes", true),
        "about" => section("about", false),
        "partners" => section("partners", false),
        "home" => {}
        other => warn!(collection = %other, "Unknown collection, purging home page only"),
    }

    let mut seen = std::collections::HashSet::new();
    urls.retain(|url| seen.insert(url.clone()));
    urls
}

/// CDN answer to a purge request
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeOutcome {
    pub success: bool,
    /// Raw provider response, echoed back on failure
    pub details: Value,
}

#[async_trait]
pub trait CachePurger: Send + Sync {
    /// Whether zone and credentials are present
    fn is_configured(&self) -> bool;

    async fn purge(&self, urls: &[String]) -> Result<PurgeOutcome>;
}

/// Cloudflare zone cache purge by URL
pub struct CloudflarePurger {
    http_client: reqwest::Client,
    settings: Option<CloudflareSettings>,
    api_base: String,
}

impl CloudflarePurger {
    pub fn new(settings: Option<CloudflareSettings>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
            api_base: CLOUDFLARE_API_BASE.to_string(),
        })
    }
}

#[async_trait]
impl CachePurger for CloudflarePurger {
    fn is_configured(&self) -> bool {
        self.settings.is_some()
    }

    async fn purge(&self, urls: &[String]) -> Result<PurgeOutcome> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| Error::Config("Cloudflare zone and token not configured".to_string()))?;

        let endpoint = format!("{}/zones/{}/purge_cache", self.api_base, settings.zone_id);
        let response = self
            .http_client
            .post(&endpoint)
            .bearer_auth(&settings.api_token)
            .json(&json!({ "files": urls }))
            .send()
            .await
            .map_err(Error::transport(CLOUDFLARE_SERVICE))?;

        // Failures still answer with a JSON body carrying `success: false`
        let details: Value = response
            .json()
            .await
            .map_err(|e| Error::decode(CLOUDFLARE_SERVICE, e))?;
        let success = details.get("success").and_then(Value::as_bool).unwrap_or(false);

        if success {
            info!(count = urls.len(), "Cache purge accepted");
        } else {
            warn!(details = %details, "Cache purge rejected");
        }

        Ok(PurgeOutcome { success, details })
    }
}
