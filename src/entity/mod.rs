//! Entity Module
//!
//! Snapshot-warmed, ID-indexed caches for upstream entities.

mod index;
mod kind;
mod record;
mod stats;
mod store;

pub use index::{RecipeIndex, SecondaryIndex};
pub use kind::EntityKind;
pub use record::{join_ids, parse_id_list, Entity, EntityId, Record};
pub use stats::{EntityCacheStats, LoadSummary};
pub use store::{EntityCache, EntityStore};

/// Cache for kinds without a secondary index.
pub type RecordCache = EntityCache<Record>;

/// Recipe cache with output/ingredient lookups.
pub type RecipeCache = EntityCache<Record, RecipeIndex>;
