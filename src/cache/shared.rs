//! Shared Response Cache
//!
//! Thread-safe response cache handle: the store behind one lock plus the
//! sweep task that shares it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::{ApproxSize, CacheStats, ResponseStore};
use crate::tasks::{spawn_sweep_task, SweepHandle};

/// Bounded LRU + TTL cache for computed responses.
///
/// Constructing one starts its expiry sweep, so a tokio runtime must be
/// running. Call [`ResponseCache::shutdown`] to stop the sweep; dropping the
/// cache aborts it.
#[derive(Debug)]
pub struct ResponseCache<V> {
    store: Arc<RwLock<ResponseStore<V>>>,
    sweeper: SweepHandle,
}

impl<V> ResponseCache<V>
where
    V: Clone + ApproxSize + Send + Sync + 'static,
{
    pub fn new(max_entries: usize, default_ttl: Duration, sweep_interval: Duration) -> Self {
        let store = Arc::new(RwLock::new(ResponseStore::new(max_entries, default_ttl)));
        let sweeper = spawn_sweep_task(store.clone(), sweep_interval);
        Self { store, sweeper }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    /// Inserts or replaces; `None` uses the cache's default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        self.store.write().await.set(key.into(), value, ttl);
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Stops the sweep task and waits for it to exit.
    pub async fn shutdown(self) {
        self.sweeper.stop().await;
    }
}
