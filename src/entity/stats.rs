//! Entity cache statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single snapshot load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Records now held by the cache
    pub loaded: usize,
    /// Lines that failed to decode and were skipped
    pub skipped: usize,
    /// Wall time spent reading and indexing
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

/// Counters for one entity cache. Reset only by `clear`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entity caches never evict; kept so every cache reports the same shape
    pub evictions: u64,
    pub loaded_records: usize,
    pub skipped_lines: usize,
    #[serde(serialize_with = "as_millis")]
    pub load_duration: Duration,
    pub last_load: Option<DateTime<Utc>>,
}

fn as_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
