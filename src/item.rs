//! Item records flowing through the pipeline

use serde::{Deserialize, Serialize};

use crate::magnet;
use crate::media::MediaOutcome;
use crate::store::{IndexRow, ItemId};

/// Most media URLs taken from one candidate
pub const MAX_MEDIA_URLS: usize = 5;

/// Record handed over by the upstream fetch/parse process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub source_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Download page link carrying the content hash
    #[serde(default)]
    pub hash_link: Option<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
}

/// A candidate with its id assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    source_url: String,
    pub title: String,
    pub candidate_media_urls: Vec<String>,
    pub acquired_media_paths: Vec<String>,
    pub magnet_link: Option<String>,
    pub popularity_count: Option<u64>,
}

impl Item {
    /// Bind `candidate` to `id`, keeping at most `max_media` URLs in order
    pub fn from_candidate(candidate: CandidateItem, id: ItemId, max_media: usize) -> Self {
        let CandidateItem {
            source_url,
            title,
            mut image_urls,
            hash_link,
            download_count,
        } = candidate;

        image_urls.truncate(max_media.min(MAX_MEDIA_URLS));
        let magnet_link = hash_link.as_deref().and_then(magnet::decode);

        Self {
            id,
            source_url,
            title,
            candidate_media_urls: image_urls,
            acquired_media_paths: Vec::new(),
            magnet_link,
            popularity_count: download_count,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Listing page the candidate came from; fixed once the item exists
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Record the stored paths from an aligned acquisition response
    pub fn apply_acquisition(&mut self, outcomes: &[MediaOutcome]) {
        self.acquired_media_paths = outcomes
            .iter()
            .filter_map(|outcome| outcome.stored_path().map(str::to_string))
            .collect();
    }

    pub fn acquisition_succeeded(&self) -> bool {
        !self.acquired_media_paths.is_empty()
    }

    pub fn to_index_row(&self) -> IndexRow {
        IndexRow {
            video_id: self.id.to_string(),
            title: self.title.clone(),
            download_link: self.magnet_link.clone(),
            download_count: self.popularity_count,
            image_count: self.acquired_media_paths.len(),
        }
    }
}
