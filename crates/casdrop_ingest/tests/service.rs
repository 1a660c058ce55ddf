//! End-to-end: files dropped into a watched directory.

mod common;

use casdrop_ingest::{run_ingest, IngestConfig};
use common::{pipeline, FakeParser, MemoryCredentials, MemorySink};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

fn config(dir: &Path) -> IngestConfig {
    IngestConfig {
        watch_dir: dir.to_path_buf(),
        workers: 2,
        queue_capacity: 8,
        ..IngestConfig::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_statements_are_ingested() {
    let dir = TempDir::new().unwrap();
    let credentials = Arc::new(MemoryCredentials::with(&[
        ("stmt_jan.pdf", "abc123"),
        ("stmt_mar.pdf", "wrong"),
    ]));
    let sink = Arc::new(MemorySink::default());
    let parser = Arc::new(FakeParser::new("abc123"));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cfg = config(dir.path());
    let service = tokio::spawn({
        let pipeline = pipeline(credentials, sink.clone(), parser.clone());
        async move { run_ingest(&cfg, pipeline, shutdown_rx).await }
    });
    // Give the watch a moment to be registered.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let jan = dir.path().join("stmt_jan.pdf");
    let feb = dir.path().join("stmt_feb.pdf");
    let mar = dir.path().join("stmt_mar.pdf");
    let report = dir.path().join("report.txt");
    std::fs::write(&report, b"not a statement").unwrap();
    std::fs::write(&jan, b"%PDF jan").unwrap();
    std::fs::write(&feb, b"%PDF feb").unwrap();
    std::fs::write(&mar, b"%PDF mar").unwrap();

    assert!(wait_until(|| !jan.exists()).await, "stmt_jan.pdf was not consumed");
    assert!(wait_until(|| parser.calls() >= 2).await, "stmt_mar.pdf was not attempted");

    shutdown_tx.send(true).unwrap();
    let stats = service.await.unwrap().unwrap();

    assert_eq!(sink.count("stmt_jan.pdf"), 1);
    assert_eq!(sink.rows().len(), 1);
    assert!(feb.exists(), "unrecognized file must stay");
    assert!(mar.exists(), "unparseable file must stay");
    assert!(report.exists());
    assert!(!parser.seen().iter().any(|name| name == "report.txt"));
    assert!(stats.processed >= 1);
    assert!(stats.not_recognized >= 1);
}

#[tokio::test]
async fn test_shutdown_before_any_event() {
    let dir = TempDir::new().unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(true);

    let stats = run_ingest(
        &config(dir.path()),
        pipeline(
            Arc::new(MemoryCredentials::default()),
            Arc::new(MemorySink::default()),
            Arc::new(FakeParser::new("abc123")),
        ),
        shutdown_rx,
    )
    .await
    .unwrap();

    assert_eq!(stats.submitted, 0);
    drop(shutdown_tx);
}

#[tokio::test]
async fn test_missing_watch_dir_is_an_error() {
    let dir = TempDir::new().unwrap();
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let result = run_ingest(
        &config(&dir.path().join("missing")),
        pipeline(
            Arc::new(MemoryCredentials::default()),
            Arc::new(MemorySink::default()),
            Arc::new(FakeParser::new("abc123")),
        ),
        shutdown_rx,
    )
    .await;

    assert!(result.is_err());
}
