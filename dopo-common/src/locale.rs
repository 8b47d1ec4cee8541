//! Locale resolution
//!
//! Maps UI language preferences to CMS content locales and picks the text
//! to display from a translation set. The fallback chain is fixed:
//! requested locale, then Italian, then the first translation, then `""`.

use crate::models::{SingletonPage, TextField, Translation};

/// Content locale used when a UI tag is not recognized
pub const DEFAULT_CONTENT_LOCALE: &str = "en-US";

/// Content locale of the station's primary language
pub const ITALIAN_LOCALE: &str = "it-IT";

/// Languages the site UI can be displayed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiLanguage {
    En,
    #[default]
    It,
}

impl UiLanguage {
    /// Exact UI tag lookup (`en` / `it`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" => Some(UiLanguage::En),
            "it" => Some(UiLanguage::It),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            UiLanguage::En => "en",
            UiLanguage::It => "it",
        }
    }

    /// CMS locale code for this language
    pub fn content_locale(self) -> &'static str {
        match self {
            UiLanguage::En => "en-US",
            UiLanguage::It => ITALIAN_LOCALE,
        }
    }
}

/// Map a UI language tag to a content locale code
pub fn resolve_locale(preference: &str) -> &'static str {
    UiLanguage::from_tag(preference)
        .map(UiLanguage::content_locale)
        .unwrap_or(DEFAULT_CONTENT_LOCALE)
}

/// Pick a UI language from a browser language header
///
/// Accepts either a single tag (`it-IT`) or a full `Accept-Language` list,
/// in which case the first entry decides. Anything that is neither Italian
/// nor English falls back to Italian.
pub fn detect_language(browser_language: Option<&str>) -> UiLanguage {
    let primary = browser_language
        .and_then(|header| header.split(',').next())
        .map(|tag| tag.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if primary.starts_with("it") {
        UiLanguage::It
    } else if primary.starts_with("en") {
        UiLanguage::En
    } else {
        UiLanguage::It
    }
}

/// Localized text for `field` following the fixed fallback chain
pub fn get_localized_field(translations: &[Translation], preference: &str, field: TextField) -> String {
    let locale = resolve_locale(preference);

    let in_locale = |code: &str| {
        translations
            .iter()
            .find(|t| t.languages_code == code)
            .and_then(|t| t.field(field))
    };

    in_locale(locale)
        .or_else(|| in_locale(ITALIAN_LOCALE))
        .or_else(|| translations.first().and_then(|t| t.field(field)))
        .unwrap_or_default()
        .to_string()
}

/// Localized text for a singleton page
///
/// Uses the translation set when there is one, otherwise a top-level field
/// of the same name.
pub fn singleton_field(page: Option<&SingletonPage>, preference: &str, field: TextField) -> String {
    let Some(page) = page else {
        return String::new();
    };

    if !page.translations.is_empty() {
        return get_localized_field(&page.translations, preference, field);
    }

    page.direct_field(field.as_str()).unwrap_or_default().to_string()
}
