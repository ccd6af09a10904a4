//! Cache Statistics Module
//!
//! Tracks response cache performance metrics and the value-size heuristic
//! behind the memory estimate.

use serde::Serialize;

/// Fixed bookkeeping cost charged per entry (map slot, recency node, instants).
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

// == Cache Stats ==
/// Snapshot of response cache counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Number of entries removed by the expiry sweep
    pub expired: u64,
    /// Current number of entries in the cache
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// hits / (hits + misses), 0 without traffic
    pub hit_rate: f64,
    /// Rough memory footprint in bytes
    pub approx_memory_bytes: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn compute_hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }
}

// == Approximate Size ==
/// Type-based guess at how many bytes a cached value occupies.
///
/// This is deliberately approximate and never walks allocator metadata.
pub trait ApproxSize {
    fn approx_size(&self) -> usize;
}

impl ApproxSize for String {
    fn approx_size(&self) -> usize {
        self.len()
    }
}

impl ApproxSize for serde_json::Value {
    fn approx_size(&self) -> usize {
        use serde_json::Value;
        match self {
            Value::Null | Value::Bool(_) => 1,
            Value::Number(_) => 8,
            Value::String(s) => s.len(),
            Value::Array(items) => 16 + items.iter().map(ApproxSize::approx_size).sum::<usize>(),
            Value::Object(map) => {
                16 + map
                    .iter()
                    .map(|(k, v)| k.len() + v.approx_size())
                    .sum::<usize>()
            }
        }
    }
}
