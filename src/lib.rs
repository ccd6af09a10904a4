//! Bulk Cache - cache-first bulk client for a typed remote data API
//!
//! Serves "get by IDs" from snapshot-warmed entity caches, fetches only the
//! misses through a rate-limited, retrying transport, and memoizes HTTP
//! responses in a bounded LRU/TTL cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod tasks;
pub mod transport;

pub use api::{create_router, AppState};
pub use cache::ResponseCache;
pub use config::Config;
pub use entity::{EntityId, EntityKind, Record};
pub use error::{Error, FetchError, Result};
pub use export::SnapshotExporter;
pub use registry::DataCacheRegistry;
pub use resolver::{BulkResolver, Resolved};
pub use service::{DataService, SearchFilter};
pub use transport::{EntityFetcher, TransportClient};
