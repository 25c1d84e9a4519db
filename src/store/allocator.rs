/// Sequential id allocation recovered from the artifact directories on disk
use std::path::Path;

use tracing::{debug, info};

use super::error::{Result, StoreError};
use super::layout::ItemId;

/// Issues strictly increasing [`ItemId`]s for one store
///
/// Directory presence is the source of truth: a `video_NN` directory left
/// behind without an index row still reserves its number.
#[derive(Debug)]
pub struct IdAllocator {
    counter: u64,
}

impl IdAllocator {
    /// Start counting after `last_issued`
    pub fn starting_after(last_issued: u64) -> Self {
        Self {
            counter: last_issued,
        }
    }

    /// Scan `root` for `video_<digits>` directories and resume after the highest
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            debug!(root = %root.display(), "Store root missing, starting from zero");
            return Ok(Self::starting_after(0));
        }

        let entries = std::fs::read_dir(root).map_err(|source| StoreError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        let mut max_seen = 0;
        let mut directories = 0usize;

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!(name = ?entry.file_name(), "Ignoring non UTF-8 directory name");
                continue;
            };

            match ItemId::parse(name) {
                Some(id) => {
                    directories += 1;
                    max_seen = max_seen.max(id.seq());
                }
                None => debug!(name, "Ignoring directory that is not an item id"),
            }
        }

        info!(
            root = %root.display(),
            directories,
            last_issued = max_seen,
            "Recovered id counter from artifact directories"
        );

        Ok(Self::starting_after(max_seen))
    }

    /// Issue the next id
    pub fn allocate(&mut self) -> ItemId {
        self.counter += 1;
        ItemId::new(self.counter)
    }

    /// Highest sequence number issued or recovered so far
    pub fn last_issued(&self) -> u64 {
        self.counter
    }

    /// Id the next call to [`allocate`](Self::allocate) will return
    pub fn peek_next(&self) -> ItemId {
        ItemId::new(self.counter + 1)
    }
}
