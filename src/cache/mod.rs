//! Response Cache Module
//!
//! Bounded in-memory caching of computed responses with TTL expiration,
//! LRU eviction and a background expiry sweep.

mod entry;
mod lru;
mod shared;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use shared::ResponseCache;
pub use stats::{ApproxSize, CacheStats, ENTRY_OVERHEAD_BYTES};
pub use store::ResponseStore;
