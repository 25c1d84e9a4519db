//! Artifact store: per-item directories plus the append-only index
//!
//! The store owns the two single-writer resources of a run, the id counter
//! and the index file handle. Both sit behind async mutexes so any number of
//! concurrent item tasks can share one `ArtifactStore` through an `Arc`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use itemstash::store::ArtifactStore;
//!
//! let store = ArtifactStore::open("./downloads")?;
//! let id = store.allocate().await;
//! store.commit(&row).await?;
//! store.close().await?;
//! ```

pub mod allocator;
pub mod error;
pub mod index;
pub mod layout;

pub use allocator::IdAllocator;
pub use error::{Result, StoreError};
pub use index::{INDEX_HEADER, IndexRow, IndexStore, read_rows};
pub use layout::{INDEX_FILE_NAME, ItemId, media_file_name, media_relative_path};

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Outcome of removing an artifact directory during rollback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cleanup {
    Removed,
    Absent,
    Failed(String),
}

impl Cleanup {
    pub fn is_failure(&self) -> bool {
        matches!(self, Cleanup::Failed(_))
    }
}

/// Store root plus its serialized id counter and index file
pub struct ArtifactStore {
    root: PathBuf,
    allocator: Mutex<IdAllocator>,
    index: Mutex<IndexStore>,
}

impl ArtifactStore {
    /// Create the root if needed, recover the counter and open the index
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        info!("Opening artifact store at: {}", root.display());

        std::fs::create_dir_all(&root).map_err(|source| StoreError::Root {
            path: root.clone(),
            source,
        })?;

        let allocator = IdAllocator::scan(&root)?;
        let index = IndexStore::open(root.join(INDEX_FILE_NAME))?;

        info!(next_id = %allocator.peek_next(), "Artifact store opened");
        Ok(Self {
            root,
            allocator: Mutex::new(allocator),
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    /// Issue the next item id
    pub async fn allocate(&self) -> ItemId {
        let mut allocator = self.allocator.lock().await;
        allocator.allocate()
    }

    /// Id the next allocation will return
    pub async fn peek_next(&self) -> ItemId {
        self.allocator.lock().await.peek_next()
    }

    /// Append a row to the index; returns once it is on disk
    pub async fn commit(&self, row: &IndexRow) -> Result<()> {
        let mut index = self.index.lock().await;
        index.append(row)
    }

    pub fn artifact_dir(&self, id: ItemId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Recursively delete the artifact directory of `id`
    ///
    /// A missing directory is not an error. Failures are logged and reported
    /// in the returned [`Cleanup`]; the next scan still counts the directory.
    pub async fn remove_artifact_dir(&self, id: ItemId) -> Cleanup {
        let dir = self.artifact_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(item_id = %id, path = %dir.display(), "Artifact directory removed");
                Cleanup::Removed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Cleanup::Absent,
            Err(e) => {
                error!(
                    item_id = %id,
                    path = %dir.display(),
                    error = %e,
                    "Failed to remove artifact directory, leaving orphan"
                );
                Cleanup::Failed(e.to_string())
            }
        }
    }

    /// Flush and release the index; safe to call more than once
    pub async fn close(&self) -> Result<()> {
        self.index.lock().await.close()
    }
}
