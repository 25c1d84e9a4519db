use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

/// Artifact store location
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_download_dir", alias = "download_directory")]
    pub download_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

/// Filters applied to candidates before they reach the pipeline
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Minimum upstream download count; 0 disables the filter
    #[serde(default, alias = "min_download_count_threshold")]
    pub min_download_count: u64,
}

/// Media acquisition settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// Items processed at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound for all media of one item
    #[serde(default = "default_acquisition_timeout_secs")]
    pub acquisition_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: ByteSize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
            concurrency: default_concurrency(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            acquisition_timeout_secs: default_acquisition_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            user_agent: default_user_agent(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_max_images() -> usize {
    5
}

fn default_concurrency() -> usize {
    8
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_acquisition_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("itemstash/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_image_bytes() -> ByteSize {
    ByteSize(20 * 1024 * 1024) // 20 MB
}
