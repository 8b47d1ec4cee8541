//! Raw CMS records to public shapes
//!
//! The `show_id` relation becomes `show`, episode audio becomes a media
//! server URL, and nested episodes get the same treatment recursively.

use dopo_common::models::{Episode, RawEpisode, RawShow, Show, ShowLink};
use dopo_common::time::parse_cms_datetime;
use dopo_common::AssetUrlBuilder;

pub fn normalize_episode(raw: RawEpisode, assets: &AssetUrlBuilder) -> Episode {
    let audio = raw
        .audio
        .as_ref()
        .filter(|audio| audio.filename_disk().is_some())
        .map(|audio| assets.media_url(Some(audio)));

    Episode {
        id: Some(raw.id),
        slug: raw.slug,
        title: raw.title,
        start: raw.start,
        end: raw.end,
        status: raw.status,
        audio,
        image: raw.image,
        show: raw.show_id.map(|link| show_from_link(link, assets)),
        translations: raw.translations,
        date_created: raw.date_created,
        date_updated: raw.date_updated,
    }
}

pub fn normalize_show(raw: RawShow, assets: &AssetUrlBuilder) -> Show {
    let mut episodes: Vec<Episode> = raw
        .episodes
        .into_iter()
        .map(|episode| normalize_episode(episode, assets))
        .collect();
    sort_by_start_desc(&mut episodes);

    Show {
        id: Some(raw.id),
        slug: raw.slug,
        name: raw.name,
        frequency: raw.frequency,
        image: raw.image,
        email: raw.email,
        translations: raw.translations,
        episodes,
    }
}

fn show_from_link(link: ShowLink, assets: &AssetUrlBuilder) -> Show {
    match link {
        ShowLink::Record(raw) => normalize_show(*raw, assets),
        ShowLink::Id(id) => Show {
            id: Some(id),
            ..Default::default()
        },
    }
}

/// Newest first; episodes without a parseable start sink to the end
pub fn sort_by_start_desc(episodes: &mut [Episode]) {
    episodes.sort_by_key(|episode| {
        std::cmp::Reverse(episode.start.as_deref().and_then(parse_cms_datetime))
    });
}
