//! Episode queries
//!
//! Every public listing applies the eligibility filter (published with
//! audio). Search narrows it, it never replaces it.

use dopo_common::models::{Episode, ItemId, RawEpisode};
use dopo_common::{AssetUrlBuilder, Filter, ItemQuery};
use tracing::debug;

use super::normalize::normalize_episode;
use crate::cms::{decode_all, ContentStore};
use crate::error::Result;
use crate::pagination::PageWindow;

pub const EPISODES: &str = "episodes";

const EPISODE_FIELDS: [&str; 8] = [
    "*",
    "translations.*",
    "show_id.id",
    "show_id.name",
    "show_id.slug",
    "show_id.image",
    "show_id.translations.*",
    "audio.filename_disk",
];

const RECENT_EPISODE_FIELDS: [&str; 5] = [
    "*",
    "show_id.id",
    "show_id.name",
    "show_id.slug",
    "audio.filename_disk",
];

async fn read_episodes(cms: &dyn ContentStore, assets: &AssetUrlBuilder, query: ItemQuery) -> Result<Vec<Episode>> {
    let raw: Vec<RawEpisode> = decode_all(cms.read_items(EPISODES, &query).await?)?;
    Ok(raw.into_iter().map(|episode| normalize_episode(episode, assets)).collect())
}

/// Eligibility filter, narrowed by a title search when one is given
pub fn listing_filter(search: Option<&str>) -> Filter {
    match search.filter(|s| !s.is_empty()) {
        Some(search) => Filter::publicly_visible().and(Filter::contains("title", search)),
        None => Filter::publicly_visible(),
    }
}

/// One page of public episodes, newest first
pub async fn list_episodes(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    window: PageWindow,
    search: Option<&str>,
) -> Result<Vec<Episode>> {
    let query = ItemQuery::new()
        .fields(EPISODE_FIELDS)
        .filter(listing_filter(search))
        .sort("-start")
        .limit(window.limit)
        .offset(window.offset);

    let episodes = read_episodes(cms, assets, query).await?;
    debug!(count = episodes.len(), offset = window.offset, "Fetched episodes page");
    Ok(episodes)
}

/// Every public episode, newest first
pub async fn all_episodes(cms: &dyn ContentStore, assets: &AssetUrlBuilder) -> Result<Vec<Episode>> {
    let query = ItemQuery::new()
        .fields(EPISODE_FIELDS)
        .filter(Filter::publicly_visible())
        .sort("-start");
    read_episodes(cms, assets, query).await
}

/// Public episode by slug
pub async fn episode_by_slug(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    slug: &str,
) -> Result<Option<Episode>> {
    let query = ItemQuery::new()
        .fields(EPISODE_FIELDS)
        .filter(Filter::eq("slug", slug).and(Filter::publicly_visible()))
        .limit(1);
    Ok(read_episodes(cms, assets, query).await?.into_iter().next())
}

/// Public episodes of one show, newest first
pub async fn episodes_by_show(
    cms: &dyn ContentStore,
    assets: &AssetUrlBuilder,
    show_id: &ItemId,
) -> Result<Vec<Episode>> {
    let query = ItemQuery::new()
        .fields(EPISODE_FIELDS)
        .filter(Filter::eq("show_id.id", show_id.clone()).and(Filter::publicly_visible()))
        .sort("-start");
    read_episodes(cms, assets, query).await
}

/// Latest public episodes for the landing page
pub async fn recent_episodes(cms: &dyn ContentStore, assets: &AssetUrlBuilder, limit: u32) -> Result<Vec<Episode>> {
    let query = ItemQuery::new()
        .fields(RECENT_EPISODE_FIELDS)
        .filter(Filter::publicly_visible())
        .sort("-start")
        .limit(limit);
    read_episodes(cms, assets, query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_keeps_eligibility() {
        let filter = listing_filter(Some("jazz"));
        assert_eq!(
            filter.to_json(),
            json!({"_and": [
                {"status": {"_eq": "published"}},
                {"audio": {"_nnull": true}},
                {"title": {"_contains": "jazz"}}
            ]})
        );
        assert!(!filter.matches(&json!({"status": "draft", "audio": "a", "title": "jazz night"})));
        assert!(filter.matches(&json!({"status": "published", "audio": "a", "title": "jazz night"})));
    }

    #[test]
    fn test_empty_search_is_plain_eligibility() {
        assert_eq!(listing_filter(Some("")), Filter::publicly_visible());
        assert_eq!(listing_filter(None), Filter::publicly_visible());
    }
}
