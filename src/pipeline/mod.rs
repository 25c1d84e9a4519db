//! Item lifecycle: allocate id → acquire media → commit or roll back
//!
//! Items run concurrently up to `concurrency`; the store serializes id
//! allocation and index appends. Each item is finalized only after its whole
//! acquisition response is known (or has timed out, which counts as failure).
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use itemstash::pipeline::{Pipeline, PipelineOptions};
//! use itemstash::store::ArtifactStore;
//!
//! let store = ArtifactStore::open("./downloads")?;
//! let pipeline = Pipeline::new(store, Arc::new(acquirer), PipelineOptions::default());
//! let summary = pipeline.run(candidates).await?;
//! println!("{}", summary);
//! ```

mod finalize;

pub use finalize::{DropReason, DropReport, Finalized, finalize};

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bon::Builder;
use futures::stream::{self, TryStreamExt};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::item::{CandidateItem, Item, MAX_MEDIA_URLS};
use crate::media::{MediaAcquirer, MediaRequest, align_outcomes};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::store::{ArtifactStore, Cleanup, StoreError};

/// Tuning knobs for a run
#[derive(Debug, Clone, Builder)]
pub struct PipelineOptions {
    /// Items in flight at once
    #[builder(default = 8)]
    pub concurrency: usize,
    /// Media URLs kept per item (capped at 5)
    #[builder(default = MAX_MEDIA_URLS)]
    pub max_media: usize,
    /// Upper bound for one item's acquisition
    #[builder(default = Duration::from_secs(300))]
    pub acquisition_timeout: Duration,
    /// Wait before sweeping a timed-out item's directory a second time
    #[builder(default = Duration::from_millis(500))]
    pub rollback_settle: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self::builder()
            .concurrency(config.media.concurrency)
            .max_media(config.media.max_images)
            .acquisition_timeout(config.acquisition_timeout())
            .build()
    }
}

/// End-of-run report
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: String,
    pub elapsed_ms: u128,
    #[serde(flatten)]
    pub counts: MetricsSnapshot,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {}: {} in {}ms", self.run_id, self.counts, self.elapsed_ms)
    }
}

pub struct Pipeline {
    store: Arc<ArtifactStore>,
    acquirer: Arc<dyn MediaAcquirer>,
    options: PipelineOptions,
    metrics: Arc<Metrics>,
    run_id: Uuid,
}

impl Pipeline {
    pub fn new(
        store: ArtifactStore,
        acquirer: Arc<dyn MediaAcquirer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store: Arc::new(store),
            acquirer,
            options,
            metrics: Arc::new(Metrics::new()),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Counters that stay readable after `run` is dropped mid-way
    pub fn metrics_handle(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one candidate through the whole lifecycle
    ///
    /// Errors are store-wide (index unwritable) and should end the run.
    pub async fn process(&self, candidate: CandidateItem) -> Result<Finalized, StoreError> {
        self.metrics.item_received();

        let id = self.store.allocate().await;
        let mut item = Item::from_candidate(candidate, id, self.options.max_media);

        let request = MediaRequest {
            item_id: id,
            urls: item.candidate_media_urls.clone(),
        };

        let mut timed_out = false;
        let outcomes = if request.urls.is_empty() {
            Vec::new()
        } else {
            match tokio::time::timeout(
                self.options.acquisition_timeout,
                self.acquirer.acquire(&request),
            )
            .await
            {
                Ok(outcomes) => outcomes,
                Err(_) => {
                    warn!(
                        item_id = %id,
                        timeout_secs = self.options.acquisition_timeout.as_secs(),
                        "Media acquisition timed out"
                    );
                    timed_out = true;
                    Vec::new()
                }
            }
        };

        let outcomes = align_outcomes(&request, outcomes);
        item.apply_acquisition(&outcomes);

        let mut finalized = finalize(&self.store, item).await?;

        // Writes already handed to the blocking pool outlive the dropped
        // acquisition future; sweep again once they have landed
        if timed_out {
            if let Finalized::Dropped(report) = &mut finalized {
                tokio::time::sleep(self.options.rollback_settle).await;
                match self.store.remove_artifact_dir(id).await {
                    Cleanup::Absent => {}
                    Cleanup::Removed => {
                        warn!(item_id = %id, "Removed media written after acquisition timeout");
                    }
                    failed @ Cleanup::Failed(_) => report.cleanup = failed,
                }
            }
        }

        match &finalized {
            Finalized::Committed(row) => self.metrics.item_committed(row.image_count),
            Finalized::Dropped(report) => self.metrics.item_dropped(report.cleanup.is_failure()),
        }
        Ok(finalized)
    }

    /// Process every candidate, then close the store
    ///
    /// Stops at the first store-wide error. The index is closed on every path.
    pub async fn run<I>(self, candidates: I) -> Result<RunSummary, StoreError>
    where
        I: IntoIterator<Item = CandidateItem>,
    {
        let started_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let started = Instant::now();
        info!(run_id = %self.run_id, concurrency = self.options.concurrency, "Pipeline run started");

        let this = &self;
        let result = stream::iter(candidates.into_iter().map(Ok::<_, StoreError>))
            .try_for_each_concurrent(this.options.concurrency.max(1), |candidate| async move {
                this.process(candidate).await.map(|_| ())
            })
            .await;

        let closed = self.store.close().await;
        result?;
        closed?;

        let summary = RunSummary {
            run_id: self.run_id.to_string(),
            started_at,
            elapsed_ms: started.elapsed().as_millis(),
            counts: self.metrics.snapshot(),
        };
        info!(
            run_id = %summary.run_id,
            committed = summary.counts.items_committed,
            dropped = summary.counts.items_dropped,
            cleanup_failures = summary.counts.cleanup_failures,
            "Pipeline run finished"
        );
        Ok(summary)
    }
}
