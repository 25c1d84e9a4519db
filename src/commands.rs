use std::path::Path;
use std::sync::Arc;

use itemstash::config::Config;
use itemstash::ingest::{passes_threshold, read_candidates};
use itemstash::magnet;
use itemstash::media::{HttpClient, HttpConfig, HttpMediaAcquirer};
use itemstash::pipeline::{Pipeline, PipelineOptions};
use itemstash::store::{ArtifactStore, INDEX_FILE_NAME, IdAllocator, read_rows};
use tracing::{info, warn};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn ingest(config: &Config, input: &Path) -> Result<(), AnyError> {
    let batch = read_candidates(input)?;
    let parsed = batch.candidates.len();

    let threshold = config.crawl.min_download_count;
    let candidates: Vec<_> = batch
        .candidates
        .into_iter()
        .filter(|candidate| passes_threshold(candidate, threshold))
        .collect();

    info!(
        parsed,
        malformed = batch.malformed,
        below_threshold = parsed - candidates.len(),
        accepted = candidates.len(),
        "Candidates loaded"
    );

    let store = ArtifactStore::open(&config.store.download_dir)?;
    let client = HttpClient::new(HttpConfig::from(&config.media))?;
    let acquirer = HttpMediaAcquirer::new(client, store.root());
    let pipeline = Pipeline::new(store, Arc::new(acquirer), PipelineOptions::from(config));
    let metrics = pipeline.metrics_handle();

    tokio::select! {
        result = pipeline.run(candidates) => {
            let summary = result?;
            println!("{}", summary);
        }
        _ = shutdown_signal() => {
            warn!("Interrupted; index closed, unfinished item directories are skipped on the next run");
            println!("interrupted: {}", metrics.snapshot());
        }
    }

    Ok(())
}

pub fn status(config: &Config) -> Result<(), AnyError> {
    let root = &config.store.download_dir;
    let allocator = IdAllocator::scan(root)?;

    let index_path = root.join(INDEX_FILE_NAME);
    let committed = if index_path.exists() {
        read_rows(&index_path)?.len()
    } else {
        0
    };

    println!("store:          {}", root.display());
    println!("next id:        {}", allocator.peek_next());
    println!("committed rows: {}", committed);
    Ok(())
}

pub fn magnet(url: &str) -> Result<(), AnyError> {
    match magnet::decode(url) {
        Some(uri) => {
            println!("{}", uri);
            Ok(())
        }
        None => Err(format!("no content hash found in {}", url).into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
