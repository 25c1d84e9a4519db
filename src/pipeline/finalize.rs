//! Commit or roll back an item once its media outcome is known

use tracing::{info, warn};

use crate::item::Item;
use crate::store::{ArtifactStore, Cleanup, IndexRow, ItemId, StoreError};

/// Terminal state of an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalized {
    /// Row appended to the index; artifact directory kept
    Committed(IndexRow),
    /// Item discarded on purpose; artifact directory removed
    Dropped(DropReport),
}

impl Finalized {
    pub fn is_committed(&self) -> bool {
        matches!(self, Finalized::Committed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NoMediaAcquired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropReport {
    pub item_id: ItemId,
    pub reason: DropReason,
    pub cleanup: Cleanup,
}

/// Decide commit vs rollback for `item`
///
/// Only an index write failure is returned as an error; a failed directory
/// removal is reported inside [`DropReport::cleanup`].
pub async fn finalize(store: &ArtifactStore, item: Item) -> Result<Finalized, StoreError> {
    let item_id = item.id();

    if item.acquisition_succeeded() {
        let row = item.to_index_row();
        store.commit(&row).await?;
        info!(
            item_id = %item_id,
            images = row.image_count,
            magnet = row.download_link.is_some(),
            title = %item.title,
            "Item committed"
        );
        return Ok(Finalized::Committed(row));
    }

    let cleanup = store.remove_artifact_dir(item_id).await;
    warn!(
        item_id = %item_id,
        source_url = %item.source_url(),
        requested = item.candidate_media_urls.len(),
        cleanup = ?cleanup,
        "Item dropped: no media acquired"
    );

    Ok(Finalized::Dropped(DropReport {
        item_id,
        reason: DropReason::NoMediaAcquired,
        cleanup,
    }))
}
