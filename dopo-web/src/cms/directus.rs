//! Directus REST client
//!
//! Items live under `/items/{collection}`; every response wraps its payload
//! in `{"data": ...}` and failures carry `{"errors": [{"message": ...}]}`.

use async_trait::async_trait;
use dopo_common::models::ItemId;
use dopo_common::ItemQuery;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ContentStore, FileUpload, CMS_SERVICE};
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("dopo-web/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: String,
}

/// Directus API client
pub struct DirectusClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl DirectusClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http_client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and unwrap the `data` envelope
    async fn execute(&self, builder: RequestBuilder) -> Result<Value> {
        let response = builder.send().await.map_err(Error::transport(CMS_SERVICE))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                service: CMS_SERVICE,
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| Error::decode(CMS_SERVICE, e))?;
        Ok(envelope.data)
    }
}

/// First Directus error message, else the raw body, else the status text
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next())
        .map(|entry| entry.message)
        .filter(|message| !message.is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl ContentStore for DirectusClient {
    async fn read_items(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Value>> {
        debug!(collection = %collection, "Reading CMS items");

        let builder = self
            .request(reqwest::Method::GET, &format!("/items/{}", collection))
            .query(&query.to_query_pairs());

        match self.execute(builder).await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::decode(
                CMS_SERVICE,
                format!("expected a list from {}, got {}", collection, kind(&other)),
            )),
        }
    }

    async fn read_item(&self, collection: &str, id: &ItemId, query: &ItemQuery) -> Result<Option<Value>> {
        debug!(collection = %collection, id = %id, "Reading CMS item");

        let builder = self
            .request(reqwest::Method::GET, &format!("/items/{}/{}", collection, id))
            .query(&query.to_query_pairs());

        match self.execute(builder).await {
            Ok(Value::Null) => Ok(None),
            Ok(item) => Ok(Some(item)),
            Err(e) => absent_item(collection, id, e),
        }
    }

    async fn read_singleton(&self, collection: &str, query: &ItemQuery) -> Result<Option<Value>> {
        debug!(collection = %collection, "Reading CMS singleton");

        let builder = self
            .request(reqwest::Method::GET, &format!("/items/{}", collection))
            .query(&query.to_query_pairs());

        match self.execute(builder).await? {
            Value::Null => Ok(None),
            // Collections not flagged as singleton still answer with a list
            Value::Array(items) => Ok(items.into_iter().next()),
            item => Ok(Some(item)),
        }
    }

    async fn create_item(&self, collection: &str, data: Value) -> Result<Value> {
        debug!(collection = %collection, "Creating CMS item");

        let builder = self
            .request(reqwest::Method::POST, &format!("/items/{}", collection))
            .json(&data);
        self.execute(builder).await
    }

    async fn update_item(&self, collection: &str, id: &ItemId, data: Value) -> Result<Value> {
        debug!(collection = %collection, id = %id, "Updating CMS item");

        let builder = self
            .request(reqwest::Method::PATCH, &format!("/items/{}/{}", collection, id))
            .json(&data);
        self.execute(builder).await
    }

    async fn upload_file(&self, file: FileUpload) -> Result<Value> {
        debug!(file_name = %file.file_name, size = file.bytes.len(), "Uploading file to CMS");

        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| Error::decode(CMS_SERVICE, format!("content type: {}", e)))?;
        }

        let builder = self
            .request(reqwest::Method::POST, "/files")
            .multipart(Form::new().part("file", part));
        self.execute(builder).await
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Directus answers 403 for items the token cannot see, including missing
/// ones. Both read as absent; a 403 is logged since a bad token looks the same.
fn absent_item(collection: &str, id: &ItemId, e: Error) -> Result<Option<Value>> {
    match e {
        Error::Upstream { status: 404, .. } => Ok(None),
        Error::Upstream { status: 403, ref message, .. } => {
            warn!(
                collection = %collection,
                id = %id,
                message = %message,
                "CMS refused item read, treating as missing (check DIRECTUS_TOKEN)"
            );
            Ok(None)
        }
        other => Err(other),
    }
}
