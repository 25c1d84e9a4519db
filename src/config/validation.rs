use super::models::Config;
use crate::item::MAX_MEDIA_URLS;
use thiserror::Error;

/// Upper bound for `media.max_retries`
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("media.max_images must be between 1 and {max}, got {actual}")]
    MaxImagesOutOfRange { actual: usize, max: usize },

    #[error("media.concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Timeout must be positive: {field} = 0")]
    ZeroTimeout { field: String },

    #[error("media.max_retries must be at most {max}, got {actual}")]
    TooManyRetries { actual: u32, max: u32 },

    #[error("media.max_image_bytes must be positive")]
    ZeroMaxImageBytes,

    #[error("store.download_dir must not be empty")]
    EmptyDownloadDir,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_store(config)?;
    validate_media(config)?;
    Ok(())
}

fn validate_store(config: &Config) -> Result<(), ValidationError> {
    if config.store.download_dir.as_os_str().is_empty() {
        return Err(ValidationError::EmptyDownloadDir);
    }
    Ok(())
}

fn validate_media(config: &Config) -> Result<(), ValidationError> {
    let media = &config.media;

    if media.max_images == 0 || media.max_images > MAX_MEDIA_URLS {
        return Err(ValidationError::MaxImagesOutOfRange {
            actual: media.max_images,
            max: MAX_MEDIA_URLS,
        });
    }

    if media.concurrency == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }

    for (field, value) in [
        ("connect_timeout_secs", media.connect_timeout_secs),
        ("request_timeout_secs", media.request_timeout_secs),
        ("acquisition_timeout_secs", media.acquisition_timeout_secs),
    ] {
        if value == 0 {
            return Err(ValidationError::ZeroTimeout {
                field: field.to_string(),
            });
        }
    }

    if media.max_retries > MAX_RETRIES {
        return Err(ValidationError::TooManyRetries {
            actual: media.max_retries,
            max: MAX_RETRIES,
        });
    }

    if media.max_image_bytes.as_u64() == 0 {
        return Err(ValidationError::ZeroMaxImageBytes);
    }

    Ok(())
}
