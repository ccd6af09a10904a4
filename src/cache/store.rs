//! Response Store Module
//!
//! LRU + TTL engine behind the response cache. Not synchronized on its own;
//! `ResponseCache` owns one behind a lock shared with the sweep task.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::stats::ENTRY_OVERHEAD_BYTES;
use crate::cache::{ApproxSize, CacheEntry, CacheStats, LruTracker};

// == Response Store ==
/// Bounded key/value storage with LRU eviction and per-entry TTL.
#[derive(Debug)]
pub struct ResponseStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency order
    lru: LruTracker,
    /// Performance counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL used when `set` is given none
    default_ttl: Duration,
}

impl<V: Clone + ApproxSize> ResponseStore<V> {
    // == Constructor ==
    /// Creates a store holding at most `max_entries` (at least one).
    pub fn new(max_entries: usize, default_ttl: Duration) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(max_entries),
            max_entries,
            default_ttl,
        }
    }

    // == Set ==
    /// Inserts or replaces a value.
    ///
    /// Replacing resets both TTL and recency. Inserting a new key into a full
    /// store evicts the single least recently used entry first, so the size
    /// never exceeds capacity.
    pub fn set(&mut self, key: String, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.replace(value, ttl);
            self.lru.touch(&key);
            return;
        }

        if self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = self.lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
            }
        }

        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Retrieves a live value and promotes it to most recently used.
    ///
    /// An expired entry is removed during this call and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get_mut(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.touch();
                false
            }
        };

        if expired {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_miss();
            return None;
        }

        self.lru.touch(key);
        self.stats.record_hit();
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Reads a live value without touching recency or counters.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| &entry.value)
    }

    // == Delete ==
    /// Removes an entry, returning whether it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries regardless of recency.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.lru.remove(key);
        }

        self.stats.record_expired(expired_keys.len());
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current counters with size, hit rate and memory estimate filled in.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.size = self.entries.len();
        stats.hit_rate = stats.compute_hit_rate();
        stats.approx_memory_bytes = self.approx_memory_bytes();
        stats
    }

    /// Key length plus value guess plus fixed overhead, summed over entries.
    pub fn approx_memory_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| key.len() + entry.value.approx_size() + ENTRY_OVERHEAD_BYTES)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lru.iter_oldest_first().map(str::to_string).collect()
    }
}
