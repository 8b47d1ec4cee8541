//! # Dopo Common Library
//!
//! Shared code for the Radio Dopo site services including:
//! - Content data model (shows, episodes, translations, singleton pages)
//! - CMS filter and query descriptions
//! - Locale resolution with the fixed fallback chain
//! - Asset URL construction for CMS images and media files
//! - Configuration loading

pub mod assets;
pub mod config;
pub mod error;
pub mod locale;
pub mod models;
pub mod query;
pub mod time;

pub use assets::{AssetRef, AssetUrlBuilder};
pub use error::{Error, Result};
pub use locale::{get_localized_field, resolve_locale, UiLanguage};
pub use query::{Filter, ItemQuery};
