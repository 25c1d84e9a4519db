//! Logging setup and run counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber
///
/// Honors `RUST_LOG`, defaulting to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Counters for one pipeline run
#[derive(Debug, Default)]
pub struct Metrics {
    items_received: AtomicU64,
    items_committed: AtomicU64,
    items_dropped: AtomicU64,
    cleanup_failures: AtomicU64,
    media_stored: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_received(&self) {
        self.items_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn item_committed(&self, media_count: usize) {
        self.items_committed.fetch_add(1, Ordering::Relaxed);
        self.media_stored
            .fetch_add(media_count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "items_committed", "Metric incremented");
    }

    pub fn item_dropped(&self, cleanup_failed: bool) {
        self.items_dropped.fetch_add(1, Ordering::Relaxed);
        if cleanup_failed {
            self.cleanup_failures.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(counter = "items_dropped", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_received: self.items_received.load(Ordering::Relaxed),
            items_committed: self.items_committed.load(Ordering::Relaxed),
            items_dropped: self.items_dropped.load(Ordering::Relaxed),
            cleanup_failures: self.cleanup_failures.load(Ordering::Relaxed),
            media_stored: self.media_stored.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub items_received: u64,
    pub items_committed: u64,
    pub items_dropped: u64,
    pub cleanup_failures: u64,
    pub media_stored: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} received, {} committed, {} dropped ({} cleanup failures), {} images stored",
            self.items_received,
            self.items_committed,
            self.items_dropped,
            self.cleanup_failures,
            self.media_stored,
        )
    }
}
