//! Content store access
//!
//! [`ContentStore`] is the narrow contract the rest of the service uses to
//! read and write CMS collections. [`DirectusClient`] implements it over the
//! Directus REST API; tests substitute an in-memory store.

pub mod directus;

pub use directus::DirectusClient;

use async_trait::async_trait;
use dopo_common::models::ItemId;
use dopo_common::ItemQuery;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Service name used in error messages and logs
pub const CMS_SERVICE: &str = "CMS";

/// File to store in the CMS asset library
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read/write access to CMS collections
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Records of `collection` matching `query`
    async fn read_items(&self, collection: &str, query: &ItemQuery) -> Result<Vec<Value>>;

    /// One record by primary key; `None` when it does not exist
    async fn read_item(&self, collection: &str, id: &ItemId, query: &ItemQuery) -> Result<Option<Value>>;

    /// Singleton collection record; `None` when it was never created
    async fn read_singleton(&self, collection: &str, query: &ItemQuery) -> Result<Option<Value>>;

    /// Create a record, returning the stored record
    async fn create_item(&self, collection: &str, data: Value) -> Result<Value>;

    /// Patch a record, returning the stored record
    async fn update_item(&self, collection: &str, id: &ItemId, data: Value) -> Result<Value>;

    /// Upload a file, returning the file record (carrying its `id`)
    async fn upload_file(&self, file: FileUpload) -> Result<Value>;
}

/// Decode a CMS record into a typed value
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::decode(CMS_SERVICE, e))
}

/// Decode every record of a listing
pub fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>> {
    values.into_iter().map(decode).collect()
}
