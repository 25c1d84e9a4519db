//! Media acquisition boundary
//!
//! The pipeline only defines the request/response contract; any fetcher
//! that implements [`MediaAcquirer`] can be plugged in. [`HttpMediaAcquirer`]
//! is the built-in reqwest implementation.
//!
//! A response is aligned by index with the request: outcome `i` belongs to
//! URL `i`, and stored paths follow `<id>/image_<i+1:02>.<ext>`.

pub mod http;

use async_trait::async_trait;
use tracing::warn;

use crate::store::ItemId;

pub use http::{DownloadError, HttpClient, HttpConfig, HttpMediaAcquirer};

/// Media fetch request for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub item_id: ItemId,
    pub urls: Vec<String>,
}

/// Per-URL result of an acquisition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaOutcome {
    /// Stored under the store root at `path`
    Stored { path: String },
    Failed { reason: String },
}

impl MediaOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, MediaOutcome::Stored { .. })
    }

    pub fn stored_path(&self) -> Option<&str> {
        match self {
            MediaOutcome::Stored { path } => Some(path),
            MediaOutcome::Failed { .. } => None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        MediaOutcome::Failed {
            reason: reason.into(),
        }
    }
}

/// Fetches the media of one item
///
/// Implementations resolve only once every URL has an outcome. Timeouts and
/// errors are reported as [`MediaOutcome::Failed`], never as a hang.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    async fn acquire(&self, request: &MediaRequest) -> Vec<MediaOutcome>;
}

/// Force a response to one outcome per requested URL
///
/// Missing entries become failures and surplus entries are discarded.
pub fn align_outcomes(request: &MediaRequest, mut outcomes: Vec<MediaOutcome>) -> Vec<MediaOutcome> {
    let expected = request.urls.len();
    if outcomes.len() != expected {
        warn!(
            item_id = %request.item_id,
            expected,
            received = outcomes.len(),
            "Acquisition response misaligned with request"
        );
    }
    outcomes.truncate(expected);
    while outcomes.len() < expected {
        outcomes.push(MediaOutcome::failed("no outcome reported"));
    }
    outcomes
}
