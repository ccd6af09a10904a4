//! Integration tests for the snapshot exporter

use std::collections::HashSet;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bulk_cache::entity::{EntityId, EntityKind, EntityStore};
use bulk_cache::export::SnapshotExporter;
use bulk_cache::transport::EntityFetcher;
use bulk_cache::{DataCacheRegistry, Error, FetchError};
use parking_lot::Mutex;
use serde_json::{json, Value};

// == Helpers ==

/// Serves `{"id": n}` for IDs 1..=total and tracks concurrency.
struct CountingFetcher {
    total: i64,
    fail_on: Option<EntityId>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    batches: AtomicUsize,
}

impl CountingFetcher {
    fn new(total: i64) -> Self {
        Self {
            total,
            fail_on: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            batches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EntityFetcher for CountingFetcher {
    async fn fetch_by_ids(&self, _endpoint: &str, ids: &[EntityId]) -> Result<Vec<u8>, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.batches.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(bad) = &self.fail_on {
            if ids.contains(bad) {
                return Err(FetchError::HttpStatus {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
        }

        let records: Vec<Value> = ids
            .iter()
            .map(|id| json!({"id": Value::from(id.clone()), "name": format!("entity {id}")}))
            .collect();
        Ok(serde_json::to_vec(&records).unwrap())
    }

    async fn fetch_ids(&self, _endpoint: &str) -> Result<Vec<EntityId>, FetchError> {
        Ok((1..=self.total).map(EntityId::Int).collect())
    }
}

/// Writer whose buffer outlives the exporter.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn written_ids(buf: &SharedBuf) -> Vec<i64> {
    let bytes = buf.0.lock().clone();
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap()["id"].as_i64().unwrap())
        .collect()
}

// == Export Tests ==

/// Every record is written exactly once across concurrent workers
#[tokio::test]
async fn test_every_record_written_once() {
    let fetcher = Arc::new(CountingFetcher::new(95));
    let exporter = SnapshotExporter::new(fetcher.clone(), 10, 3);
    let ids: Vec<EntityId> = (1..=95).map(EntityId::Int).collect();
    let sink = SharedBuf::default();

    let summary = exporter.export_ids("v2/items", &ids, sink.clone()).await.unwrap();

    assert_eq!(summary.requested, 95);
    assert_eq!(summary.written, 95);
    assert_eq!(summary.batches, 10);
    assert_eq!(fetcher.batches.load(Ordering::SeqCst), 10);

    let written = written_ids(&sink);
    assert_eq!(written.len(), 95);
    let unique: HashSet<i64> = written.into_iter().collect();
    assert_eq!(unique, (1..=95).collect::<HashSet<_>>());
}

/// Worker count bounds concurrency regardless of batch count
#[tokio::test]
async fn test_worker_pool_is_bounded() {
    let fetcher = Arc::new(CountingFetcher::new(200));
    let exporter = SnapshotExporter::new(fetcher.clone(), 5, 4);
    let ids: Vec<EntityId> = (1..=200).map(EntityId::Int).collect();

    exporter
        .export_ids("v2/items", &ids, SharedBuf::default())
        .await
        .unwrap();

    let peak = fetcher.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak concurrency {peak} exceeded worker count");
    assert!(peak >= 2);
}

/// Batch size is clamped to the upstream page maximum
#[test]
fn test_batch_size_clamped() {
    let fetcher = Arc::new(CountingFetcher::new(0));
    assert_eq!(SnapshotExporter::new(fetcher.clone(), 10_000, 0).batch_size(), 200);
    assert_eq!(SnapshotExporter::new(fetcher.clone(), 0, 0).batch_size(), 1);
    assert_eq!(SnapshotExporter::new(fetcher, 1, 0).workers(), 1);
}

/// A failed batch fails the export and leaves no snapshot behind
#[tokio::test]
async fn test_failed_batch_leaves_no_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut fetcher = CountingFetcher::new(30);
    fetcher.fail_on = Some(EntityId::Int(17));
    let exporter = SnapshotExporter::new(Arc::new(fetcher), 10, 2);

    let err = exporter
        .export_kind(EntityKind::Items, dir.path())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(FetchError::HttpStatus { status: 500, .. })));
    assert!(!dir.path().join("items.json").exists());
    assert!(!dir.path().join("items.json.tmp").exists());
}

/// An exported snapshot loads back into the registry
#[tokio::test]
async fn test_exported_snapshot_loads_into_registry() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = SnapshotExporter::new(Arc::new(CountingFetcher::new(42)), 8, 3);

    let summary = exporter
        .export_kind(EntityKind::Skills, dir.path())
        .await
        .unwrap();
    assert_eq!(summary.written, 42);
    assert_eq!(summary.endpoint, "v2/skills");

    let registry = DataCacheRegistry::new();
    let report = registry.load_from_directory(dir.path()).unwrap();

    assert_eq!(report.total_records(), 42);
    assert_eq!(report.total_skipped(), 0);
    let skills = registry.cache(EntityKind::Skills);
    assert_eq!(skills.len(), 42);
    assert_eq!(
        skills.get_by_id(&EntityId::Int(7)).unwrap().name(),
        Some("entity 7")
    );
}
