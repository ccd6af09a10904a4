//! Snapshot Exporter
//!
//! Downloads a kind in fixed-size batches across a bounded pool of workers and
//! writes one JSON record per line, producing the files the registry loads.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::entity::{EntityId, EntityKind};
use crate::error::{Error, FetchError, Result};
use crate::resolver::decode_one_or_many;
use crate::transport::{EntityFetcher, MAX_PAGE_SIZE};

/// Outcome of one export run.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub endpoint: String,
    pub requested: usize,
    pub written: usize,
    pub batches: usize,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Bulk downloader writing NDJSON snapshots.
///
/// Workers share the fetcher, and with it the transport's rate limiter. Output
/// order across batches is unspecified; each batch is written contiguously.
pub struct SnapshotExporter {
    fetcher: Arc<dyn EntityFetcher>,
    batch_size: usize,
    workers: usize,
}

impl SnapshotExporter {
    pub fn new(fetcher: Arc<dyn EntityFetcher>, batch_size: usize, workers: usize) -> Self {
        Self {
            fetcher,
            batch_size: batch_size.clamp(1, MAX_PAGE_SIZE as usize),
            workers: workers.max(1),
        }
    }

    pub fn from_config(fetcher: Arc<dyn EntityFetcher>, config: &Config) -> Self {
        Self::new(fetcher, config.export_batch_size, config.export_workers)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fetches `ids` from `endpoint` and writes every record to `sink`.
    ///
    /// The first failing batch aborts the remaining ones and its error is
    /// returned; records already written stay in the sink.
    pub async fn export_ids<W>(&self, endpoint: &str, ids: &[EntityId], sink: W) -> Result<ExportSummary>
    where
        W: Write + Send + 'static,
    {
        let started = Instant::now();
        let sink = Arc::new(Mutex::new(sink));
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        let batches: Vec<Vec<EntityId>> = ids.chunks(self.batch_size).map(<[EntityId]>::to_vec).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&sink);
            let permits = Arc::clone(&permits);
            let endpoint = endpoint.to_string();

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|_| FetchError::Cancelled)?;
                let body = fetcher.fetch_by_ids(&endpoint, &batch).await?;
                let records: Vec<Value> = decode_one_or_many(&body)?;
                write_batch(&sink, &records)?;
                debug!(
                    "Batch {}/{} of {} wrote {} records",
                    index + 1,
                    batch_count,
                    endpoint,
                    records.len()
                );
                Ok::<usize, Error>(records.len())
            });
        }

        let mut written = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(count)) => written += count,
                Ok(Err(e)) => {
                    warn!("Export of {} failed, aborting remaining batches: {}", endpoint, e);
                    tasks.abort_all();
                    return Err(e);
                }
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                Err(_) => {}
            }
        }

        sink.lock().flush()?;

        let summary = ExportSummary {
            endpoint: endpoint.to_string(),
            requested: ids.len(),
            written,
            batches: batch_count,
            duration: started.elapsed(),
        };
        info!(
            "Exported {} of {} records from {} in {} batches ({:?})",
            summary.written, summary.requested, endpoint, summary.batches, summary.duration
        );
        Ok(summary)
    }

    /// Exports every ID of `kind` to `<dir>/<kind>.json`.
    ///
    /// Writes to a temporary file first; the snapshot is replaced only when
    /// every batch succeeded.
    pub async fn export_kind(&self, kind: EntityKind, dir: &Path) -> Result<ExportSummary> {
        let endpoint = kind.endpoint();
        let ids = self.fetcher.fetch_ids(&endpoint).await?;

        fs::create_dir_all(dir)?;
        let path = dir.join(kind.snapshot_file());
        let tmp = path.with_extension("json.tmp");
        let file = BufWriter::new(File::create(&tmp)?);

        match self.export_ids(&endpoint, &ids, file).await {
            Ok(summary) => {
                fs::rename(&tmp, &path)?;
                info!("Wrote {} snapshot to {}", kind, path.display());
                Ok(summary)
            }
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&tmp) {
                    debug!("Could not remove {}: {}", tmp.display(), remove_err);
                }
                Err(e)
            }
        }
    }
}

/// Serializes a batch, then writes it under the sink lock in one call.
fn write_batch<W: Write>(sink: &Mutex<W>, records: &[Value]) -> Result<()> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record).map_err(std::io::Error::from)?;
        buf.push(b'\n');
    }
    sink.lock().write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_batch_emits_one_line_per_record() {
        let sink = Mutex::new(Vec::new());
        write_batch(&sink, &[json!({"id": 1}), json!({"id": 2, "name": "x"})]).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "{\"id\":1}\n{\"id\":2,\"name\":\"x\"}\n");
    }
}
