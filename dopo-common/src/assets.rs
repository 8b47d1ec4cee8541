//! Asset URL construction
//!
//! Two asset families are served from different origins:
//! - processed media (episode audio) lives on the media server under
//!   `{media_origin}/media/assets/{filename_disk}`
//! - images go through the CMS transformation endpoint at
//!   `{cms_origin}/assets/{id}`
//!
//! Both builders are total: missing references produce an empty string and
//! values that are already absolute URLs are returned unchanged.

use serde::{Deserialize, Serialize};

/// Stored file reference as it appears in CMS records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetRef {
    /// Bare filename, asset identifier, partial `assets/` path or full URL
    Path(String),
    /// Expanded file object
    File(FileObject),
}

/// Subset of the CMS file record used to locate an asset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_disk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl AssetRef {
    /// Storage filename for media-server lookups
    pub fn filename_disk(&self) -> Option<&str> {
        let name = match self {
            AssetRef::Path(path) => Some(path.as_str()),
            AssetRef::File(file) => file.filename_disk.as_deref(),
        };
        name.filter(|s| !s.is_empty())
    }

    /// Best identifier for CMS image lookups
    fn image_key(&self) -> Option<&str> {
        let key = match self {
            AssetRef::Path(path) => Some(path.as_str()),
            AssetRef::File(file) => [&file.filename_disk, &file.id, &file.filename]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .find(|s| !s.is_empty()),
        };
        key.filter(|s| !s.is_empty())
    }
}

impl From<&str> for AssetRef {
    fn from(value: &str) -> Self {
        AssetRef::Path(value.to_string())
    }
}

/// Builds fully-qualified asset URLs for the two serving origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUrlBuilder {
    cms_origin: String,
    media_origin: String,
}

impl AssetUrlBuilder {
    pub fn new(cms_origin: impl Into<String>, media_origin: impl Into<String>) -> Self {
        Self {
            cms_origin: trim_origin(cms_origin.into()),
            media_origin: trim_origin(media_origin.into()),
        }
    }

    /// URL of an already-processed media file (episode audio)
    pub fn media_url(&self, asset: Option<&AssetRef>) -> String {
        match asset.and_then(AssetRef::filename_disk) {
            Some(name) if self.is_absolute(name) => name.to_string(),
            Some(name) => format!("{}/media/assets/{}", self.media_origin, strip_assets_prefix(name)),
            None => String::new(),
        }
    }

    /// URL of a CMS-transformed image
    pub fn image_url(&self, asset: Option<&AssetRef>) -> String {
        match asset.and_then(AssetRef::image_key) {
            Some(key) if self.is_absolute(key) => key.to_string(),
            Some(key) => format!("{}/assets/{}", self.cms_origin, strip_assets_prefix(key)),
            None => String::new(),
        }
    }

    fn is_absolute(&self, value: &str) -> bool {
        value.starts_with(&self.cms_origin) || value.starts_with("http")
    }
}

fn trim_origin(origin: String) -> String {
    origin.trim_end_matches('/').to_string()
}

/// Keeps only what follows the first `assets/` segment
fn strip_assets_prefix(value: &str) -> &str {
    match value.split_once("assets/") {
        Some((_, rest)) => rest,
        None => value,
    }
}
