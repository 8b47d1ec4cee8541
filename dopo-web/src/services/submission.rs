//! Episode detail submission by show hosts
//!
//! The form linked from the reminder email lets a host set the episode
//! title, image and English/Italian descriptions. Input is validated in
//! full before the CMS is contacted.

use dopo_common::assets::AssetRef;
use dopo_common::locale::ITALIAN_LOCALE;
use dopo_common::models::{ItemId, RawEpisode, ShowLink, Translation};
use dopo_common::ItemQuery;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::cms::{decode, ContentStore, FileUpload};
use crate::error::{Error, Result};
use crate::queries::episodes::EPISODES;

pub const TRANSLATIONS: &str = "episodes_translations";

const ENGLISH_LOCALE: &str = "en-US";

pub const TITLE_REQUIRED: &str = "Episode title is required.";
pub const DESCRIPTION_REQUIRED: &str = "At least one description (EN or IT) is required.";
pub const IMAGE_REQUIRED: &str = "Episode image is required.";
pub const UPDATE_FAILED: &str = "Failed to update episode. Please try again.";

const FORM_FIELDS: [&str; 9] = [
    "id",
    "title",
    "image",
    "start",
    "end",
    "translations.*",
    "show_id.id",
    "show_id.name",
    "show_id.slug",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowSummary {
    pub id: ItemId,
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Episode as presented to the submission form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionEpisode {
    pub id: ItemId,
    pub title: Option<String>,
    pub image: Option<AssetRef>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub translations: Vec<Translation>,
    pub show: Option<ShowSummary>,
}

impl From<RawEpisode> for SubmissionEpisode {
    fn from(raw: RawEpisode) -> Self {
        let show = raw.show_id.map(|link| match link {
            ShowLink::Record(show) => ShowSummary {
                id: show.id,
                name: show.name,
                slug: show.slug,
            },
            ShowLink::Id(id) => ShowSummary {
                id,
                name: None,
                slug: None,
            },
        });

        Self {
            id: raw.id,
            title: raw.title,
            image: raw.image,
            start: raw.start,
            end: raw.end,
            translations: raw.translations,
            show,
        }
    }
}

pub async fn load_submission_episode(cms: &dyn ContentStore, id: &ItemId) -> Result<Option<SubmissionEpisode>> {
    let query = ItemQuery::new().fields(FORM_FIELDS);
    match cms.read_item(EPISODES, id, &query).await? {
        Some(value) => Ok(Some(decode::<RawEpisode>(value)?.into())),
        None => Ok(None),
    }
}

/// Raw form input, as submitted
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub title: Option<String>,
    pub description_en: Option<String>,
    pub description_it: Option<String>,
    pub image: Option<FileUpload>,
}

/// Form input that passed validation, trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSubmission {
    pub title: String,
    pub description_en: Option<String>,
    pub description_it: Option<String>,
    pub image: FileUpload,
}

/// Error body echoing the submitted text back to the form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionEcho {
    pub error: String,
    pub title: Option<String>,
    pub description_en: Option<String>,
    pub description_it: Option<String>,
}

impl SubmissionForm {
    pub fn echo(&self, error: &str) -> SubmissionEcho {
        SubmissionEcho {
            error: error.to_string(),
            title: self.title.clone(),
            description_en: self.description_en.clone(),
            description_it: self.description_it.clone(),
        }
    }

    /// Checks run in order: title, a description, image
    pub fn validate(&self) -> std::result::Result<EpisodeSubmission, SubmissionEcho> {
        let Some(title) = trimmed(self.title.as_deref()) else {
            return Err(self.echo(TITLE_REQUIRED));
        };

        let description_en = trimmed(self.description_en.as_deref());
        let description_it = trimmed(self.description_it.as_deref());
        if description_en.is_none() && description_it.is_none() {
            return Err(self.echo(DESCRIPTION_REQUIRED));
        }

        let Some(image) = self.image.clone().filter(|file| !file.bytes.is_empty()) else {
            return Err(self.echo(IMAGE_REQUIRED));
        };

        Ok(EpisodeSubmission {
            title,
            description_en,
            description_it,
            image,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Write a validated submission to the CMS
///
/// Steps: read current translations, upload the image, update the episode,
/// then update or create one translation per provided description. Steps
/// already applied stay applied if a later one fails.
pub async fn apply_submission(cms: &dyn ContentStore, episode_id: &ItemId, submission: EpisodeSubmission) -> Result<()> {
    let query = ItemQuery::new().fields(["id", "translations.*"]);
    let current: RawEpisode = match cms.read_item(EPISODES, episode_id, &query).await? {
        Some(value) => decode(value)?,
        None => return Err(Error::NotFound(format!("Episode {}", episode_id))),
    };

    let uploaded = cms.upload_file(submission.image).await?;

    let mut episode_update = json!({ "title": submission.title });
    if let Some(file_id) = uploaded.get("id").filter(|id| !id.is_null()) {
        episode_update["image"] = file_id.clone();
    }
    cms.update_item(EPISODES, episode_id, episode_update).await?;

    let descriptions = [
        (ENGLISH_LOCALE, submission.description_en),
        (ITALIAN_LOCALE, submission.description_it),
    ];
    for (locale, description) in descriptions {
        let Some(description) = description else {
            continue;
        };
        let data = json!({ "title": submission.title, "description": description });

        let existing = current
            .translations
            .iter()
            .find(|t| t.languages_code == locale)
            .and_then(|t| t.id.as_ref());

        match existing {
            Some(translation_id) => {
                cms.update_item(TRANSLATIONS, translation_id, data).await?;
            }
            None => {
                let mut data = data;
                data["episodes_id"] = Value::from(episode_id.clone());
                data["languages_code"] = Value::from(locale);
                cms.create_item(TRANSLATIONS, data).await?;
            }
        }
    }

    info!(episode_id = %episode_id, "Episode submission applied");
    Ok(())
}
