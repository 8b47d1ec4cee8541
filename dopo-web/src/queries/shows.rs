//! Show queries

use dopo_common::models::{ItemId, RawShow, Show};
use dopo_common::{AssetUrlBuilder, Filter, ItemQuery};
use tracing::debug;

use super::normalize::normalize_show;
use crate::cms::{decode_all, ContentStore};
use crate::error::Result;
use crate::pagination::PageWindow;

pub const SHOWS: &str = "shows";

const SHOW_FIELDS: [&str; 2] = ["*", "translations.*"];

const SHOW_WITH_EPISODES_FIELDS: [&str; 8] = [
    "*",
    "translations.*",
    "episodes.*",
    "episodes.translations.*",
    "episodes.show_id.id",
    "episodes.show_id.name",
    "episodes.show_id.slug",
    "episodes.audio.filename_disk",
];

async fn read_shows(cms: &dyn ContentStore, assets: &AssetUrlBuilder, query: ItemQuery) -> Result<Vec<Show>> {
    let raw: Vec<RawShow> = decode_all(cms.read_items(SHOWS, &query).await?)?;
    Ok(raw.into_iter().map(|show| normalize_show(show, assets)).collect())
}

/// One page of shows by name, optionally narrowed by a name search
pub async fn list_shows(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    window: PageWindow,
    search: Option<&str>,
) -> Result<Vec<Show>> {
    let mut query = ItemQuery::new()
        .fields(SHOW_FIELDS)
        .sort("name")
        .limit(window.limit)
        .offset(window.offset);
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query = query.filter(Filter::contains("name", search));
    }

    let shows = read_shows(cms, assets, query).await?;
    debug!(count = shows.len(), offset = window.offset, "Fetched shows page");
    Ok(shows)
}

/// Every show, sorted by name
pub async fn all_shows(cms: &dyn ContentStore, assets: &AssetUrlBuilder) -> Result<Vec<Show>> {
    read_shows(cms, assets, ItemQuery::new().fields(SHOW_FIELDS).sort("name")).await
}

/// Show with its episodes, newest first
///
/// Nested episodes are not eligibility-filtered here; page builders decide
/// what to display.
pub async fn show_by_slug(cms: &dyn ContentStore, assets: &AssetUrlBuilder, slug: &str) -> Result<Option<Show>> {
    let query = ItemQuery::new()
        .fields(SHOW_WITH_EPISODES_FIELDS)
        .filter(Filter::eq("slug", slug))
        .limit(1);
    Ok(read_shows(cms, assets, query).await?.into_iter().next())
}

pub async fn show_by_id(cms: &dyn ContentStore, assets: &AssetUrlBuilder, id: &ItemId) -> Result<Option<Show>> {
    let query = ItemQuery::new()
        .fields(["*"])
        .filter(Filter::eq("id", id.clone()))
        .limit(1);
    Ok(read_shows(cms, assets, query).await?.into_iter().next())
}
