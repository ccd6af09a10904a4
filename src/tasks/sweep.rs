//! Expiry Sweep Task
//!
//! Background task that periodically removes expired response cache entries,
//! including keys that were set once and never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{ApproxSize, ResponseStore};

/// Owning handle for a running sweep task.
///
/// `stop` ends the task cleanly; dropping the handle aborts it, so the task
/// never outlives the cache that owns the handle.
#[derive(Debug)]
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Signals the task to stop and waits for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

/// Spawns a task that sweeps `store` every `interval`.
///
/// The sweep takes the same write lock as foreground `get`/`set`, so it never
/// observes a half-applied mutation.
pub fn spawn_sweep_task<V>(store: Arc<RwLock<ResponseStore<V>>>, interval: Duration) -> SweepHandle
where
    V: Clone + ApproxSize + Send + Sync + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let interval = interval.max(Duration::from_millis(1));

    let join = tokio::spawn(async move {
        info!("Starting expiry sweep with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so the first sweep
        // happens one interval after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    debug!("Expiry sweep received shutdown");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = store.write().await.cleanup_expired();
                    if removed > 0 {
                        info!("Expiry sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Expiry sweep: no expired entries found");
                    }
                }
            }
        }
    });

    SweepHandle {
        shutdown: Some(shutdown_tx),
        join: Some(join),
    }
}
