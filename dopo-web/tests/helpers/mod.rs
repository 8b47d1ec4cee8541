//! Shared test doubles for dopo-web integration tests
//!
//! Every external collaborator of [`AppState`] has an in-memory stand-in
//! that records what it was asked to do.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::{DateTime, Utc};
use dopo_common::config::{CliOverrides, SiteConfig, TomlConfig};
use dopo_common::models::ItemId;
use dopo_common::query::lookup;
use dopo_common::ItemQuery;
use dopo_web::cms::{ContentStore, FileUpload};
use dopo_web::services::calendar::{CalendarFeed, CalendarSource};
use dopo_web::services::email::{EmailSender, ShowInfoRequest};
use dopo_web::services::purge::{CachePurger, PurgeOutcome};
use dopo_web::{build_router, AppState, Error, Result};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const SITE_URL: &str = "https://radio.test";
pub const CMS_URL: &str = "https://cms.radio.test";
pub const MEDIA_URL: &str = "https://media.radio.test";
pub const CRON_SECRET: &str = "cron-secret";
pub const WEBHOOK_SECRET: &str = "hook-secret";

// ============================================================================
// Content store
// ============================================================================

/// Write recorded by [`FakeCms`]
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Create { collection: String, data: Value },
    Update { collection: String, id: String, data: Value },
    Upload { file_name: String, size: usize },
}

/// In-memory CMS evaluating filters, sort and page windows like the real one
#[derive(Default)]
pub struct FakeCms {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    singletons: Mutex<HashMap<String, Value>>,
    writes: Mutex<Vec<Write>>,
    queries: Mutex<Vec<(String, ItemQuery)>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    failing_collections: Mutex<Vec<String>>,
    fail_on_update: Mutex<bool>,
}

impl FakeCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, collection: &str, items: Vec<Value>) -> Self {
        self.collections
            .lock()
            .unwrap()
            .insert(collection.to_string(), items);
        self
    }

    pub fn with_singleton(self, collection: &str, item: Value) -> Self {
        self.singletons
            .lock()
            .unwrap()
            .insert(collection.to_string(), item);
        self
    }

    /// Every call fails with an upstream error carrying `message`
    pub fn failing(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Calls touching `collection` fail, the rest succeed
    pub fn failing_collection(self, collection: &str) -> Self {
        self.failing_collections
            .lock()
            .unwrap()
            .push(collection.to_string());
        self
    }

    /// Reads succeed, updates fail
    pub fn failing_updates(self) -> Self {
        *self.fail_on_update.lock().unwrap() = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, ItemQuery)> {
        self.queries.lock().unwrap().clone()
    }

    fn enter(&self, collection: &str) -> Result<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        let failure = self.failure.lock().unwrap().clone().or_else(|| {
            self.failing_collections
                .lock()
                .unwrap()
                .iter()
                .any(|c| c == collection)
                .then(|| format!("{} unavailable", collection))
        });
        match failure {
            Some(message) => Err(Error::Upstream {
                service: "CMS",
                status: 503,
                message,
            }),
            None => Ok(()),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn apply_query(mut items: Vec<Value>, query: &ItemQuery) -> Vec<Value> {
    if let Some(filter) = &query.filter {
        items.retain(|item| filter.matches(item));
    }
    for key in query.sort.iter().rev() {
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key.as_str(), false),
        };
        items.sort_by(|a, b| {
            let order = compare_values(lookup(a, field), lookup(b, field));
            if descending {
                order.reverse()
            } else {
                order
            }
        });
    }
    let offset = query.offset.unwrap_or(0) as usize;
    let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl ContentStore for FakeCms {
    async fn read_items(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Value>> {
        self.enter(collection)?;
        self.queries
            .lock()
            .unwrap()
            .push((collection.to_string(), query.clone()));
        let items = self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default();
        Ok(apply_query(items, query))
    }

    async fn read_item(&self, collection: &str, id: &ItemId, _query: &ItemQuery) -> Result<Option<Value>> {
        self.enter(collection)?;
        let wanted = id.to_string();
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|items| {
                items
                    .iter()
                    .find(|item| match item.get("id") {
                        Some(Value::String(s)) => *s == wanted,
                        Some(Value::Number(n)) => n.to_string() == wanted,
                        _ => false,
                    })
                    .cloned()
            }))
    }

    async fn read_singleton(&self, collection: &str, _query: &ItemQuery) -> Result<Option<Value>> {
        self.enter(collection)?;
        Ok(self.singletons.lock().unwrap().get(collection).cloned())
    }

    async fn create_item(&self, collection: &str, data: Value) -> Result<Value> {
        self.enter(collection)?;
        self.writes.lock().unwrap().push(Write::Create {
            collection: collection.to_string(),
            data: data.clone(),
        });
        Ok(data)
    }

    async fn update_item(&self, collection: &str, id: &ItemId, data: Value) -> Result<Value> {
        self.enter(collection)?;
        if *self.fail_on_update.lock().unwrap() {
            return Err(Error::Upstream {
                service: "CMS",
                status: 500,
                message: "update rejected".to_string(),
            });
        }
        self.writes.lock().unwrap().push(Write::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            data: data.clone(),
        });
        Ok(data)
    }

    async fn upload_file(&self, file: FileUpload) -> Result<Value> {
        self.enter("directus_files")?;
        self.writes.lock().unwrap().push(Write::Upload {
            file_name: file.file_name.clone(),
            size: file.bytes.len(),
        });
        Ok(json!({ "id": "file-1", "filename_download": file.file_name }))
    }
}

// ============================================================================
// Mailer, purger, calendar
// ============================================================================

/// Records sent requests; addresses listed in `failing` are refused
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<ShowInfoRequest>>,
    failing: Vec<String>,
}

impl FakeMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<ShowInfoRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for FakeMailer {
    async fn send_show_info_request(&self, request: &ShowInfoRequest) -> Result<()> {
        if self.failing.contains(&request.to) {
            return Err(Error::Upstream {
                service: "Mailjet",
                status: 400,
                message: "Email sending failed: invalid recipient".to_string(),
            });
        }
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}

pub struct FakePurger {
    configured: bool,
    succeed: bool,
    purged: Mutex<Vec<Vec<String>>>,
}

impl FakePurger {
    pub fn accepting() -> Self {
        Self {
            configured: true,
            succeed: true,
            purged: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            succeed: false,
            ..Self::accepting()
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::accepting()
        }
    }

    pub fn purged(&self) -> Vec<Vec<String>> {
        self.purged.lock().unwrap().clone()
    }
}

#[async_trait]
impl CachePurger for FakePurger {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn purge(&self, urls: &[String]) -> Result<PurgeOutcome> {
        self.purged.lock().unwrap().push(urls.to_vec());
        Ok(PurgeOutcome {
            success: self.succeed,
            details: json!({ "success": self.succeed, "errors": [] }),
        })
    }
}

/// Calendar returning a fixed feed, or failing
pub struct FakeCalendar {
    feed: Option<Value>,
    requested: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakeCalendar {
    pub fn with_events(items: Value) -> Self {
        Self {
            feed: Some(json!({ "items": items })),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            feed: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSource for FakeCalendar {
    async fn events_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<CalendarFeed> {
        self.requested.lock().unwrap().push((from, to));
        match &self.feed {
            Some(feed) => serde_json::from_value(feed.clone()).map_err(|e| Error::decode("Google Calendar", e)),
            None => Err(Error::Upstream {
                service: "Google Calendar",
                status: 403,
                message: "Failed to fetch calendar: quota".to_string(),
            }),
        }
    }
}

// ============================================================================
// App wiring
// ============================================================================

pub fn test_config() -> SiteConfig {
    let mut config = SiteConfig::resolve(&CliOverrides::default(), &TomlConfig::default(), |_| None);
    config.site_url = SITE_URL.to_string();
    config.cms_url = CMS_URL.to_string();
    config.media_url = MEDIA_URL.to_string();
    config.scheduler_enabled = false;
    config.cron_secret = Some(CRON_SECRET.to_string());
    config.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config
}

/// Collaborators of one test app, kept for assertions
pub struct TestApp {
    pub cms: Arc<FakeCms>,
    pub mailer: Arc<FakeMailer>,
    pub purger: Arc<FakePurger>,
    pub calendar: Arc<FakeCalendar>,
    pub router: axum::Router,
}

pub struct TestAppBuilder {
    config: SiteConfig,
    cms: FakeCms,
    mailer: FakeMailer,
    purger: FakePurger,
    calendar: FakeCalendar,
}

impl TestAppBuilder {
    pub fn new(cms: FakeCms) -> Self {
        Self {
            config: test_config(),
            cms,
            mailer: FakeMailer::default(),
            purger: FakePurger::accepting(),
            calendar: FakeCalendar::with_events(json!([])),
        }
    }

    pub fn config(mut self, edit: impl FnOnce(&mut SiteConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn mailer(mut self, mailer: FakeMailer) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn purger(mut self, purger: FakePurger) -> Self {
        self.purger = purger;
        self
    }

    pub fn calendar(mut self, calendar: FakeCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn build(self) -> TestApp {
        let cms = Arc::new(self.cms);
        let mailer = Arc::new(self.mailer);
        let purger = Arc::new(self.purger);
        let calendar = Arc::new(self.calendar);
        let state = AppState::new(
            self.config,
            cms.clone(),
            mailer.clone(),
            purger.clone(),
            calendar.clone(),
        );
        TestApp {
            cms,
            mailer,
            purger,
            calendar,
            router: build_router(state),
        }
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}

pub fn post_json(uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Part of a multipart body: `(name, filename, content)`
pub type Part<'a> = (&'a str, Option<&'a str>, &'a str);

pub fn post_multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let boundary = "dopo-test-boundary";
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/jpeg\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn episode(id: &str, slug: &str, start: &str, status: &str, audio: Option<&str>) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "title": format!("Episode {}", id),
        "start": start,
        "status": status,
        "audio": audio.map(|f| json!({ "filename_disk": f })),
        "show_id": { "id": 1, "name": "Night Shift", "slug": "night-shift" },
        "translations": [],
        "date_created": "2025-01-01T10:00:00",
        "date_updated": null
    })
}

pub fn show(id: i64, name: &str, slug: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "frequency": "weekly",
        "image": format!("img-{}", id),
        "email": format!("{}@hosts.test", slug),
        "translations": [
            { "id": id * 10, "languages_code": "it-IT", "description": format!("{} in italiano", name) },
            { "id": id * 10 + 1, "languages_code": "en-US", "description": format!("{} in English", name) }
        ]
    })
}
