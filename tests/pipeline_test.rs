//! End-to-end lifecycle tests against a real artifact store on disk
//!
//! Media acquisition is scripted: URLs under `/ok/` are "downloaded" by
//! writing a small file, URLs under `/fail/` report failure after creating
//! the artifact directory (the partial state rollback must clean up).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use itemstash::item::CandidateItem;
use itemstash::media::{MediaAcquirer, MediaOutcome, MediaRequest};
use itemstash::pipeline::{Finalized, Pipeline, PipelineOptions};
use itemstash::store::{ArtifactStore, Cleanup, IdAllocator, media_relative_path, read_rows};

struct ScriptedAcquirer {
    root: PathBuf,
}

#[async_trait]
impl MediaAcquirer for ScriptedAcquirer {
    async fn acquire(&self, request: &MediaRequest) -> Vec<MediaOutcome> {
        let dir = self.root.join(request.item_id.to_string());
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let mut outcomes = Vec::new();
        for (i, url) in request.urls.iter().enumerate() {
            if url.contains("/ok/") {
                let relative = media_relative_path(request.item_id, i + 1, url);
                tokio::fs::write(self.root.join(&relative), b"img").await.unwrap();
                outcomes.push(MediaOutcome::Stored { path: relative });
            } else {
                outcomes.push(MediaOutcome::failed("HTTP 404"));
            }
        }
        outcomes
    }
}

/// Leaves a plain file where the artifact directory belongs, so rollback
/// cannot remove it
struct FileInPlaceOfDir {
    root: PathBuf,
}

#[async_trait]
impl MediaAcquirer for FileInPlaceOfDir {
    async fn acquire(&self, request: &MediaRequest) -> Vec<MediaOutcome> {
        tokio::fs::write(self.root.join(request.item_id.to_string()), b"not a dir")
            .await
            .unwrap();
        request
            .urls
            .iter()
            .map(|_| MediaOutcome::failed("HTTP 500"))
            .collect()
    }
}

fn candidate(title: &str, ok: usize, fail: usize) -> CandidateItem {
    let mut image_urls: Vec<String> = (0..ok)
        .map(|i| format!("https://img.example/ok/{}.jpg", i))
        .collect();
    image_urls.extend((0..fail).map(|i| format!("https://img.example/fail/{}.png", i)));

    CandidateItem {
        source_url: format!("https://board.example/{}", title),
        title: title.to_string(),
        image_urls,
        hash_link: None,
        download_count: None,
    }
}

fn pipeline_at(root: &Path) -> Pipeline {
    let store = ArtifactStore::open(root).unwrap();
    let acquirer = ScriptedAcquirer {
        root: root.to_path_buf(),
    };
    Pipeline::new(store, Arc::new(acquirer), PipelineOptions::default())
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_commit_then_rollback_then_next_id() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let pipeline = pipeline_at(root);

    // A: two images succeed
    let a = pipeline.process(candidate("T1", 2, 0)).await.unwrap();
    assert!(a.is_committed());
    assert_eq!(file_count(&root.join("video_01")), 2);

    // B: nothing succeeds
    let b = pipeline.process(candidate("T2", 0, 2)).await.unwrap();
    match b {
        Finalized::Dropped(report) => {
            assert_eq!(report.item_id.to_string(), "video_02");
            assert_eq!(report.cleanup, Cleanup::Removed);
        }
        other => panic!("expected drop, got {:?}", other),
    }
    assert!(!root.join("video_02").exists());

    // C: counter moved past B
    let c = pipeline.process(candidate("T3", 1, 0)).await.unwrap();
    match c {
        Finalized::Committed(row) => assert_eq!(row.video_id, "video_03"),
        other => panic!("expected commit, got {:?}", other),
    }

    pipeline.run(Vec::new()).await.unwrap();

    let content = std::fs::read_to_string(root.join("index.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "\u{FEFF}video_id,title,download_link,download_count,image_count",
            "video_01,T1,,,2",
            "video_03,T3,,,1",
        ]
    );
}

#[tokio::test]
async fn test_empty_candidate_leaves_no_trace() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let pipeline = pipeline_at(root);

    let finalized = pipeline.process(candidate("empty", 0, 0)).await.unwrap();
    assert!(!finalized.is_committed());
    pipeline.run(Vec::new()).await.unwrap();

    assert!(!root.join("video_01").exists());
    assert!(read_rows(root.join("index.csv")).unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_success_counts_only_stored_images() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let summary = pipeline_at(root)
        .run(vec![candidate("mixed", 2, 3)])
        .await
        .unwrap();
    assert_eq!(summary.counts.items_committed, 1);
    assert_eq!(summary.counts.media_stored, 2);

    let rows = read_rows(root.join("index.csv")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].image_count, 2);
    assert_eq!(file_count(&root.join("video_01")), 2);
}

#[tokio::test]
async fn test_restart_resumes_after_existing_directories() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let first = pipeline_at(root)
        .run(vec![candidate("one", 1, 0), candidate("two", 1, 0)])
        .await
        .unwrap();
    assert_eq!(first.counts.items_committed, 2);

    // Orphan left by a crash between directory creation and commit
    std::fs::create_dir(root.join("video_05")).unwrap();

    assert_eq!(IdAllocator::scan(root).unwrap().peek_next().to_string(), "video_06");

    let pipeline = pipeline_at(root);
    let finalized = pipeline.process(candidate("three", 1, 0)).await.unwrap();
    match finalized {
        Finalized::Committed(row) => assert_eq!(row.video_id, "video_06"),
        other => panic!("expected commit, got {:?}", other),
    }
    pipeline.run(Vec::new()).await.unwrap();

    let rows = read_rows(root.join("index.csv")).unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.video_id.as_str()).collect();
    assert_eq!(ids, vec!["video_01", "video_02", "video_06"]);

    let content = std::fs::read_to_string(root.join("index.csv")).unwrap();
    assert_eq!(content.matches("video_id,title").count(), 1);
}

#[tokio::test]
async fn test_concurrent_run_keeps_rows_and_directories_in_sync() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let candidates: Vec<CandidateItem> = (0..40)
        .map(|i| {
            if i % 3 == 0 {
                candidate(&format!("drop-{}", i), 0, 2)
            } else {
                candidate(&format!("keep-{}", i), 1 + i % 5, 1)
            }
        })
        .collect();

    let store = ArtifactStore::open(root).unwrap();
    let acquirer = ScriptedAcquirer {
        root: root.to_path_buf(),
    };
    let options = PipelineOptions::builder().concurrency(8).build();
    let summary = Pipeline::new(store, Arc::new(acquirer), options)
        .run(candidates)
        .await
        .unwrap();

    assert_eq!(summary.counts.items_received, 40);
    assert_eq!(summary.counts.items_dropped, 14);
    assert_eq!(summary.counts.items_committed, 26);

    let rows = read_rows(root.join("index.csv")).unwrap();
    assert_eq!(rows.len(), 26);

    let mut row_ids: Vec<String> = rows.iter().map(|r| r.video_id.clone()).collect();
    row_ids.sort();
    row_ids.dedup();
    assert_eq!(row_ids.len(), 26);

    // Every row has a directory holding exactly image_count files
    for row in &rows {
        assert_eq!(file_count(&root.join(&row.video_id)), row.image_count);
    }

    // And every item directory has a row
    let mut dirs: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().unwrap().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    dirs.sort();
    assert_eq!(dirs, row_ids);
}

#[tokio::test]
async fn test_magnet_and_count_flow_into_row() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let hash = "c0ffee".repeat(6) + "abcd";

    let mut item = candidate("with, comma", 1, 0);
    item.hash_link = Some(format!("https://www.rmdown.com/link.php?hash=233{}", hash));
    item.download_count = Some(4521);

    pipeline_at(root).run(vec![item]).await.unwrap();

    let rows = read_rows(root.join("index.csv")).unwrap();
    assert_eq!(rows[0].title, "with, comma");
    assert_eq!(
        rows[0].download_link.as_deref(),
        Some(format!("magnet:?xt=urn:btih:{}", hash).as_str())
    );
    assert_eq!(rows[0].download_count, Some(4521));
}

#[tokio::test]
async fn test_cleanup_failure_is_reported_and_run_continues() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let store = ArtifactStore::open(root).unwrap();
    let acquirer = FileInPlaceOfDir {
        root: root.to_path_buf(),
    };
    let pipeline = Pipeline::new(store, Arc::new(acquirer), PipelineOptions::default());

    match pipeline.process(candidate("stuck", 0, 1)).await.unwrap() {
        Finalized::Dropped(report) => {
            assert_eq!(report.item_id.to_string(), "video_01");
            assert!(matches!(report.cleanup, Cleanup::Failed(_)));
        }
        other => panic!("expected drop, got {:?}", other),
    }

    let summary = pipeline.run(vec![candidate("stuck-again", 0, 2)]).await.unwrap();
    assert_eq!(summary.counts.items_received, 2);
    assert_eq!(summary.counts.items_committed, 0);
    assert_eq!(summary.counts.items_dropped, 2);
    assert_eq!(summary.counts.cleanup_failures, 2);

    // Leftovers stay on disk, but nothing reached the index
    assert!(root.join("video_01").is_file());
    assert!(root.join("video_02").is_file());
    assert!(read_rows(root.join("index.csv")).unwrap().is_empty());
}
