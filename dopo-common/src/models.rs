//! Content data model
//!
//! `Raw*` types mirror what the CMS returns for a given field selection.
//! Normalized types ([`Show`], [`Episode`]) are what handlers serialize: the
//! show relation is exposed as `show` and episode audio is a resolved URL.
//!
//! Decoding is lenient. CMS content is allowed to be incomplete, so
//! relation lists tolerate `null`, a single object, or unexpanded ids.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::assets::AssetRef;

/// Status value of episodes visible to the public
pub const STATUS_PUBLISHED: &str = "published";

/// Status value of episodes excluded from reminders
pub const STATUS_ARCHIVED: &str = "archived";

/// CMS primary key: integer for shows, UUID string for episodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(id) => write!(f, "{}", id),
            ItemId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        ItemId::Int(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Text(id.to_string())
    }
}

impl From<ItemId> for Value {
    fn from(id: ItemId) -> Self {
        match id {
            ItemId::Int(id) => Value::from(id),
            ItemId::Text(id) => Value::from(id),
        }
    }
}

/// Localized text fields carried by a [`Translation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Description,
    Content,
}

impl TextField {
    pub fn as_str(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Description => "description",
            TextField::Content => "content",
        }
    }
}

/// One locale's text for a show, episode or singleton page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Translation {
    /// Field value, treating empty strings as absent
    pub fn field(&self, field: TextField) -> Option<&str> {
        let value = match field {
            TextField::Title => self.title.as_deref(),
            TextField::Description => self.description.as_deref(),
            TextField::Content => self.content.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Show as returned by the CMS
#[derive(Debug, Clone, Deserialize)]
pub struct RawShow {
    pub id: ItemId,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub image: Option<AssetRef>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_translations")]
    pub translations: Vec<Translation>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub episodes: Vec<RawEpisode>,
}

/// Episode's `show_id` relation, expanded or not
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShowLink {
    Record(Box<RawShow>),
    Id(ItemId),
}

/// Episode as returned by the CMS
#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisode {
    pub id: ItemId,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub audio: Option<AssetRef>,
    #[serde(default)]
    pub image: Option<AssetRef>,
    #[serde(default)]
    pub show_id: Option<ShowLink>,
    #[serde(default, deserialize_with = "lenient_translations")]
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
}

/// Normalized show
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Show {
    pub id: Option<ItemId>,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub frequency: Option<String>,
    pub image: Option<AssetRef>,
    /// Host contact address, never part of public responses
    #[serde(skip_serializing)]
    pub email: Option<String>,
    pub translations: Vec<Translation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<Episode>,
}

/// Normalized episode
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Episode {
    pub id: Option<ItemId>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: Option<String>,
    /// Fully-qualified media URL
    pub audio: Option<String>,
    pub image: Option<AssetRef>,
    pub show: Option<Show>,
    pub translations: Vec<Translation>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
}

impl Episode {
    /// Eligibility for public listings: published and carrying audio
    pub fn is_public(&self) -> bool {
        self.status.as_deref() == Some(STATUS_PUBLISHED) && self.audio.is_some()
    }
}

/// Entry of the home singleton's image gallery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ItemId>,
    #[serde(default)]
    pub directus_files_id: Option<AssetRef>,
}

/// Singleton page (home, about, partners)
///
/// Fields other than translations and images pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingletonPage {
    #[serde(default)]
    pub id: Option<ItemId>,
    #[serde(
        default,
        deserialize_with = "lenient_translations",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub translations: Vec<Translation>,
    #[serde(
        default,
        deserialize_with = "lenient_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub images: Vec<HomeImage>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SingletonPage {
    /// Top-level string field that is not part of the translations
    pub fn direct_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Title pair the schedule UI expects for a calendar slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub title: String,
    pub name: String,
}

/// Derived calendar entry, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    #[serde(serialize_with = "crate::time::serialize_iso_millis")]
    pub start: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "crate::time::serialize_iso_millis")]
    pub end: chrono::DateTime<chrono::Utc>,
    pub playlist: Playlist,
    pub description: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Object entries of an array that decode as `T`; anything else is dropped
pub fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(decode_object).collect(),
        _ => Vec::new(),
    })
}

/// Like [`lenient_list`], also accepting a single translation object
pub fn lenient_translations<'de, D>(deserializer: D) -> Result<Vec<Translation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(decode_object).collect(),
        Some(object @ Value::Object(_)) => decode_object(object).into_iter().collect(),
        _ => Vec::new(),
    })
}

fn decode_object<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Object(_) => match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(error = %e, "Dropping undecodable nested record");
                None
            }
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id_accepts_numbers_and_strings() {
        let ids: Vec<ItemId> = serde_json::from_value(json!([7, "a1b2"])).unwrap();
        assert_eq!(ids, vec![ItemId::Int(7), ItemId::Text("a1b2".into())]);
        assert_eq!(ids[0].to_string(), "7");
        assert_eq!(ids[1].to_string(), "a1b2");
    }

    #[test]
    fn test_episode_relation_expanded_or_bare() {
        let expanded: RawEpisode = serde_json::from_value(json!({
            "id": "e1",
            "show_id": {"id": 3, "name": "Night Shift", "slug": "night-shift"}
        }))
        .unwrap();
        match expanded.show_id {
            Some(ShowLink::Record(show)) => assert_eq!(show.name.as_deref(), Some("Night Shift")),
            other => panic!("expected expanded show, got {:?}", other),
        }

        let bare: RawEpisode = serde_json::from_value(json!({"id": "e2", "show_id": 3})).unwrap();
        assert!(matches!(bare.show_id, Some(ShowLink::Id(ItemId::Int(3)))));
    }

    #[test]
    fn test_translations_tolerate_malformed_shapes() {
        let null: RawShow = serde_json::from_value(json!({"id": 1, "translations": null})).unwrap();
        assert!(null.translations.is_empty());

        let ids: RawShow = serde_json::from_value(json!({"id": 1, "translations": [4, 5]})).unwrap();
        assert!(ids.translations.is_empty());

        let single: SingletonPage = serde_json::from_value(json!({
            "id": 1,
            "translations": {"languages_code": "it-IT", "content": "Ciao"}
        }))
        .unwrap();
        assert_eq!(single.translations.len(), 1);
        assert_eq!(single.translations[0].field(TextField::Content), Some("Ciao"));

        let mixed: RawShow = serde_json::from_value(json!({
            "id": 1,
            "translations": [{"languages_code": null, "title": "x"}, "junk"]
        }))
        .unwrap();
        assert_eq!(mixed.translations.len(), 1);
        assert_eq!(mixed.translations[0].languages_code, "");
    }

    #[test]
    fn test_undecodable_nested_episode_is_dropped() {
        let show: RawShow = serde_json::from_value(json!({
            "id": 1,
            "episodes": [{"id": 10, "slug": "kept"}, {"slug": "no-id"}, {"id": 11, "title": ["not", "text"]}]
        }))
        .unwrap();
        assert_eq!(show.episodes.len(), 1);
        assert_eq!(show.episodes[0].slug.as_deref(), Some("kept"));
    }

    #[test]
    fn test_empty_field_counts_as_absent() {
        let t = Translation {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(t.field(TextField::Description), None);
    }

    #[test]
    fn test_singleton_keeps_unknown_fields() {
        let page: SingletonPage = serde_json::from_value(json!({
            "id": 1,
            "headline": "Welcome",
            "images": [{"id": 9, "directus_files_id": "file-1"}, 12]
        }))
        .unwrap();
        assert_eq!(page.direct_field("headline"), Some("Welcome"));
        assert_eq!(page.images.len(), 1);

        let out = serde_json::to_value(&page).unwrap();
        assert_eq!(out["headline"], "Welcome");
        assert_eq!(out["images"][0]["directus_files_id"], "file-1");
    }

    #[test]
    fn test_show_email_not_serialized() {
        let show = Show {
            email: Some("host@example.org".into()),
            ..Default::default()
        };
        let out = serde_json::to_value(&show).unwrap();
        assert!(out.get("email").is_none());
    }

    #[test]
    fn test_episode_public_eligibility() {
        let mut episode = Episode {
            status: Some(STATUS_PUBLISHED.into()),
            audio: Some("https://media.example.org/media/assets/a.mp3".into()),
            ..Default::default()
        };
        assert!(episode.is_public());

        episode.audio = None;
        assert!(!episode.is_public());

        episode.audio = Some("x".into());
        episode.status = Some("draft".into());
        assert!(!episode.is_public());
    }
}
