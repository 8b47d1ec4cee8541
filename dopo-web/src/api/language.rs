//! Visitor language preference
//!
//! The preference lives on the client. Each request states it through, in
//! order: the `lang` query parameter, the `language` cookie, then the
//! browser's `Accept-Language`. Italian is the fallback.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{
        header::{ACCEPT_LANGUAGE, COOKIE},
        request::Parts,
    },
};
use dopo_common::locale::detect_language;
use dopo_common::UiLanguage;
use serde::Deserialize;
use std::convert::Infallible;

/// Cookie holding the chosen UI language
pub const LANGUAGE_COOKIE: &str = "language";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferredLanguage(pub UiLanguage);

/// `?lang=`; other query parameters are ignored
#[derive(Debug, Default, Deserialize)]
pub struct LanguageParam {
    #[serde(default)]
    pub lang: Option<String>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PreferredLanguage {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A malformed query string is treated as carrying no preference
        let param = Query::<LanguageParam>::try_from_uri(&parts.uri)
            .map(|Query(param)| param)
            .unwrap_or_default();

        let headers = &parts.headers;
        let cookies = headers.get(COOKIE).and_then(|v| v.to_str().ok());
        let accept_language = headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        Ok(PreferredLanguage(language_from_request(
            param.lang.as_deref(),
            cookies,
            accept_language,
        )))
    }
}

/// Resolve the preference from the decoded `lang` parameter and raw headers
pub fn language_from_request(lang: Option<&str>, cookies: Option<&str>, accept_language: Option<&str>) -> UiLanguage {
    lang.and_then(UiLanguage::from_tag)
        .or_else(|| cookies.and_then(language_cookie).and_then(UiLanguage::from_tag))
        .unwrap_or_else(|| detect_language(accept_language))
}

fn language_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == LANGUAGE_COOKIE).then_some(value.trim().trim_matches('"'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_wins() {
        assert_eq!(
            language_from_request(Some("en"), Some("language=it"), Some("it-IT")),
            UiLanguage::En
        );
    }

    #[test]
    fn test_cookie_then_header() {
        assert_eq!(
            language_from_request(None, Some("theme=dark; language=en"), Some("it-IT")),
            UiLanguage::En
        );
        assert_eq!(language_from_request(None, Some("theme=dark"), Some("en-US,en;q=0.9")), UiLanguage::En);
    }

    #[test]
    fn test_unknown_values_fall_through() {
        assert_eq!(language_from_request(Some("fr"), None, Some("en-GB")), UiLanguage::En);
        assert_eq!(language_from_request(Some("fr"), Some("language=en"), None), UiLanguage::En);
        assert_eq!(language_from_request(None, None, None), UiLanguage::It);
        assert_eq!(language_from_request(None, None, Some("de-DE")), UiLanguage::It);
    }

    async fn extract(uri: &str, cookie: Option<&str>) -> UiLanguage {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let PreferredLanguage(language) = PreferredLanguage::from_request_parts(&mut parts, &()).await.unwrap();
        language
    }

    #[tokio::test]
    async fn test_query_parameter_is_decoded() {
        assert_eq!(extract("/api/pages/about?limit=5&lang=%65n", None).await, UiLanguage::En);
        assert_eq!(extract("/api/pages/about?lang=+en+", Some("language=it")).await, UiLanguage::En);
    }

    #[tokio::test]
    async fn test_cookie_used_without_query() {
        assert_eq!(extract("/api/pages/about", Some("theme=dark; language=\"en\"")).await, UiLanguage::En);
        assert_eq!(extract("/api/pages/about?lang=", Some("language=en")).await, UiLanguage::En);
    }
}
