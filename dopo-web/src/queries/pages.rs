//! Singleton pages and the data each public page is built from

use dopo_common::assets::AssetRef;
use dopo_common::locale::singleton_field;
use dopo_common::models::{Episode, SingletonPage, TextField};
use dopo_common::{get_localized_field, AssetUrlBuilder, ItemQuery, UiLanguage};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::debug;

use super::episodes::{episode_by_slug, recent_episodes};
use super::shows::show_by_slug;
use crate::cms::{decode, ContentStore};
use crate::error::Result;

/// Episodes shown on the landing page
pub const LANDING_EPISODE_COUNT: u32 = 6;

/// Social preview image used when a page has none of its own
pub const DEFAULT_OG_IMAGE: &str = "/images/og-image.jpg";

/// SEO descriptions are cut to this many characters
const DESCRIPTION_CHARS: usize = 160;

const ABOUT_FALLBACK: &str = "Established in 2024, Radio Dopo is a Palermo-based community radio \
station, working with artists, cultural workers and non-profit organizations, borne from a \
partnership with like-minded community radio stations Kiosk Radio in Brussels and Refuge \
Worldwide in Berlin.";

async fn singleton(cms: &dyn ContentStore, collection: &str, fields: &[&str]) -> Result<Option<SingletonPage>> {
    let query = ItemQuery::new().fields(fields.iter().copied());
    match cms.read_singleton(collection, &query).await? {
        Some(value) => Ok(Some(decode(value)?)),
        None => {
            debug!(collection = %collection, "Singleton has no content");
            Ok(None)
        }
    }
}

pub async fn home_content(cms: &dyn ContentStore) -> Result<Option<SingletonPage>> {
    singleton(cms, "home", &["*", "images.*"]).await
}

pub async fn about_page(cms: &dyn ContentStore) -> Result<Option<SingletonPage>> {
    singleton(cms, "about", &["*", "translations.*"]).await
}

pub async fn partners_page(cms: &dyn ContentStore) -> Result<Option<SingletonPage>> {
    singleton(cms, "partners", &["*", "translations.*"]).await
}

/// Landing page: latest episodes and one random gallery image
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub episodes: Vec<Episode>,
    pub random_image: Option<AssetRef>,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowPage {
    pub show: dopo_common::models::Show,
    /// Public episodes only
    pub episodes: Vec<Episode>,
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodePage {
    pub episode: Episode,
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AboutPage {
    pub about: Option<SingletonPage>,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PartnersPage {
    pub partners: Option<SingletonPage>,
    pub title: String,
}

/// Both fetches run concurrently; either failing fails the page
pub async fn landing_page(cms: &dyn ContentStore, assets: &AssetUrlBuilder, site_name: &str) -> Result<LandingPage> {
    let (episodes, home) = tokio::try_join!(
        recent_episodes(cms, assets, LANDING_EPISODE_COUNT),
        home_content(cms)
    )?;

    let random_image = home
        .as_ref()
        .and_then(|home| home.images.choose(&mut rand::thread_rng()))
        .and_then(|image| image.directus_files_id.clone());

    Ok(LandingPage {
        episodes,
        random_image,
        title: site_name.to_string(),
    })
}

pub async fn show_page(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    slug: &str,
    language: UiLanguage,
    site_name: &str,
) -> Result<Option<ShowPage>> {
    let Some(mut show) = show_by_slug(cms, assets, slug).await? else {
        return Ok(None);
    };

    // Nested episodes leave the show so only the public list is serialized
    let episodes: Vec<Episode> = std::mem::take(&mut show.episodes)
        .into_iter()
        .filter(Episode::is_public)
        .collect();
    let name = show.name.clone().unwrap_or_default();

    let description = non_empty(get_localized_field(&show.translations, language.tag(), TextField::Description))
        .unwrap_or_else(|| format!("Listen to episodes from {} on {}.", name, site_name));

    Ok(Some(ShowPage {
        title: format!("{} - {}", name, site_name),
        description,
        image: preview_image(assets, show.image.as_ref()),
        episodes,
        show,
    }))
}

pub async fn episode_page(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    slug: &str,
    language: UiLanguage,
    site_name: &str,
) -> Result<Option<EpisodePage>> {
    let Some(episode) = episode_by_slug(cms, assets, slug).await? else {
        return Ok(None);
    };

    let title = episode.title.clone().unwrap_or_default();
    let show_name = episode.show.as_ref().and_then(|show| show.name.as_deref());

    let description = non_empty(get_localized_field(&episode.translations, language.tag(), TextField::Description))
        .unwrap_or_else(|| match show_name {
            Some(show) => format!("Listen to {} from {} on {}.", title, show, site_name),
            None => format!("Listen to {} on {}.", title, site_name),
        });

    let image = preview_image(assets, episode.show.as_ref().and_then(|show| show.image.as_ref()));

    Ok(Some(EpisodePage {
        title: format!("{} - {}", title, site_name),
        description,
        image,
        episode,
    }))
}

pub async fn about_page_data(cms: &dyn ContentStore, language: UiLanguage, site_name: &str) -> Result<AboutPage> {
    let about = about_page(cms).await?;

    let content = singleton_field(about.as_ref(), language.tag(), TextField::Content);
    let description = non_empty(content.chars().take(DESCRIPTION_CHARS).collect())
        .unwrap_or_else(|| ABOUT_FALLBACK.to_string());

    Ok(AboutPage {
        about,
        title: format!("About - {}", site_name),
        description,
    })
}

pub async fn partners_page_data(cms: &dyn ContentStore, site_name: &str) -> Result<PartnersPage> {
    Ok(PartnersPage {
        partners: partners_page(cms).await?,
        title: format!("Partners - {}", site_name),
    })
}

fn preview_image(assets: &AssetUrlBuilder, image: Option<&AssetRef>) -> String {
    non_empty(assets.image_url(image)).unwrap_or_else(|| DEFAULT_OG_IMAGE.to_string())
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}
