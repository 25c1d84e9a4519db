//! Configuration management for itemstash
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use itemstash::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Artifacts stored under: {}", config.store.download_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ITEMSTASH__<section>__<key>`
//!
//! Examples:
//! - `ITEMSTASH__STORE__DOWNLOAD_DIR=/data/items`
//! - `ITEMSTASH__CRAWL__MIN_DOWNLOAD_COUNT=100`
//! - `ITEMSTASH__MEDIA__MAX_IMAGE_BYTES=10MB`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/itemstash.toml`.
//! This can be overridden using the `ITEMSTASH_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, CrawlConfig, MediaConfig, StoreConfig};
pub use validation::ValidationError;

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_secs(self.media.acquisition_timeout_secs)
    }
}
