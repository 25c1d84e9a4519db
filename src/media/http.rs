//! HTTP client and disk-backed media acquirer

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::join_all;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{MediaAcquirer, MediaOutcome, MediaRequest};
use crate::config::MediaConfig;
use crate::store::{ItemId, media_relative_path};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Body of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl DownloadError {
    /// Errors that will not change on another attempt
    fn is_permanent(&self) -> bool {
        match self {
            DownloadError::InvalidUrl(_) | DownloadError::TooLarge { .. } => true,
            DownloadError::Status(code) => (400..500).contains(code) && *code != 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub user_agent: String,
    pub max_body_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            user_agent: format!("itemstash/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

impl From<&MediaConfig> for HttpConfig {
    fn from(media: &MediaConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(media.connect_timeout_secs),
            request_timeout: Duration::from_secs(media.request_timeout_secs),
            max_retries: media.max_retries,
            retry_backoff: Duration::from_millis(media.retry_backoff_ms),
            user_agent: media.user_agent.clone(),
            max_body_bytes: media.max_image_bytes.as_u64(),
        }
    }
}

/// Exponential backoff after `attempt` failures: base, 2x base, 4x base, ...
///
/// Saturates instead of overflowing for large attempt counts.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.checked_mul(factor).unwrap_or(Duration::MAX)
}

/// HTTP downloader
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| DownloadError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Download a resource with retry
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.download_once(url).await {
                Ok(bytes) => {
                    if attempts > 1 {
                        debug!(url, attempts, "Download succeeded after retry");
                    }
                    return Ok(bytes);
                }
                Err(e) if e.is_permanent() => {
                    warn!(url, attempts, error = %e, "Download failed permanently");
                    return Err(e);
                }
                Err(e) => {
                    if attempts >= self.config.max_retries.max(1) {
                        warn!(url, attempts, error = %e, "Download failed after retries");
                        return Err(e);
                    }

                    warn!(url, attempts, error = %e, "Download failed, retrying");

                    tokio::time::sleep(backoff_delay(self.config.retry_backoff, attempts)).await;
                }
            }
        }
    }

    /// Download once (no retry)
    async fn download_once(&self, url: &str) -> Result<Bytes> {
        debug!(url, "Starting download");

        let parsed = reqwest::Url::parse(url).map_err(|e| DownloadError::InvalidUrl(e.to_string()))?;

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::Timeout
            } else if e.is_redirect() {
                DownloadError::TooManyRedirects
            } else {
                DownloadError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let limit = self.config.max_body_bytes;
        if let Some(size) = response.content_length() {
            if size > limit {
                return Err(DownloadError::TooLarge { size, limit });
            }
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::Timeout
            } else {
                DownloadError::RequestFailed(format!("Failed to read body: {}", e))
            }
        })?;

        if bytes.len() as u64 > limit {
            return Err(DownloadError::TooLarge {
                size: bytes.len() as u64,
                limit,
            });
        }

        debug!(url, size = bytes.len(), "Download completed");

        Ok(bytes)
    }
}

/// Fetches item media over HTTP into `<root>/<id>/image_NN.<ext>`
pub struct HttpMediaAcquirer {
    client: HttpClient,
    root: PathBuf,
}

impl HttpMediaAcquirer {
    pub fn new(client: HttpClient, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    async fn fetch_one(&self, item_id: ItemId, index: usize, url: &str) -> MediaOutcome {
        let relative = media_relative_path(item_id, index, url);

        let bytes = match self.client.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => return MediaOutcome::failed(e.to_string()),
        };

        if bytes.is_empty() {
            return MediaOutcome::failed("empty response body");
        }

        let destination = self.root.join(&relative);
        if let Some(parent) = destination.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return MediaOutcome::failed(format!("create directory: {}", e));
            }
        }

        match tokio::fs::write(&destination, &bytes).await {
            Ok(()) => {
                debug!(item_id = %item_id, path = %relative, size = bytes.len(), "Media stored");
                MediaOutcome::Stored { path: relative }
            }
            Err(e) => MediaOutcome::failed(format!("write {}: {}", relative, e)),
        }
    }
}

#[async_trait]
impl MediaAcquirer for HttpMediaAcquirer {
    async fn acquire(&self, request: &MediaRequest) -> Vec<MediaOutcome> {
        let fetches = request
            .urls
            .iter()
            .enumerate()
            .map(|(i, url)| self.fetch_one(request.item_id, i + 1, url));

        let outcomes = join_all(fetches).await;

        let stored = outcomes.iter().filter(|o| o.succeeded()).count();
        info!(
            item_id = %request.item_id,
            requested = request.urls.len(),
            stored,
            "Media acquisition finished"
        );
        outcomes
    }
}
