/// Append-only CSV ledger of committed items
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{Result, StoreError};

/// Byte-order mark written once at the start of a new index file
const UTF8_BOM: &[u8] = "\u{FEFF}".as_bytes();

/// Fixed column order of the index file
pub const INDEX_HEADER: [&str; 5] = [
    "video_id",
    "title",
    "download_link",
    "download_count",
    "image_count",
];

/// One committed item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub video_id: String,
    pub title: String,
    pub download_link: Option<String>,
    pub download_count: Option<u64>,
    pub image_count: usize,
}

impl IndexRow {
    fn to_record(&self) -> [String; 5] {
        [
            self.video_id.clone(),
            self.title.clone(),
            self.download_link.clone().unwrap_or_default(),
            self.download_count.map(|c| c.to_string()).unwrap_or_default(),
            self.image_count.to_string(),
        ]
    }
}

/// Index file handle; every append is flushed and synced before returning
pub struct IndexStore {
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    rows_appended: usize,
}

impl IndexStore {
    /// Open `path` for appending, writing BOM + header if the file is new
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // An empty file left by a crash right after creation counts as new
        let is_new = std::fs::metadata(&path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        if is_new {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);

        if is_new {
            writer.write_record(INDEX_HEADER)?;
            writer.flush()?;
            writer.get_ref().sync_data()?;
            info!(path = %path.display(), "Created index file");
        } else {
            info!(path = %path.display(), "Opened existing index file for append");
        }

        Ok(Self {
            path,
            writer: Some(writer),
            rows_appended: 0,
        })
    }

    /// Append one row and make it durable
    pub fn append(&mut self, row: &IndexRow) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(StoreError::Closed)?;

        writer.write_record(row.to_record())?;
        writer.flush()?;
        writer.get_ref().sync_data()?;

        self.rows_appended += 1;
        debug!(video_id = %row.video_id, "Index row appended");
        Ok(())
    }

    /// Flush and release the file handle; safe to call more than once
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
            info!(
                path = %self.path.display(),
                rows = self.rows_appended,
                "Index file closed"
            );
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Rows written through this handle since it was opened
    pub fn rows_appended(&self) -> usize {
        self.rows_appended
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(path = %self.path.display(), error = %e, "Failed to close index file");
        }
    }
}

/// Load every committed row from an index file
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<IndexRow>> {
    let content = std::fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.deserialize::<IndexRow>() {
        rows.push(record?);
    }
    Ok(rows)
}
