//! Data Cache Registry
//!
//! Owns one entity cache per kind and warms them from a snapshot directory.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::entity::{
    EntityCacheStats, EntityKind, EntityStore, LoadSummary, RecipeCache, Record, RecordCache,
};
use crate::error::{Error, Result};

/// Per-kind result of a directory load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryLoadReport {
    /// Kinds whose snapshot loaded, with their summaries
    pub loaded: Vec<(EntityKind, LoadSummary)>,
    /// Kinds without a snapshot file; they stay unloaded
    pub missing: Vec<EntityKind>,
}

impl RegistryLoadReport {
    pub fn total_records(&self) -> usize {
        self.loaded.iter().map(|(_, s)| s.loaded).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.loaded.iter().map(|(_, s)| s.skipped).sum()
    }
}

/// Statistics for one kind.
#[derive(Debug, Clone, Serialize)]
pub struct KindStats {
    pub kind: EntityKind,
    pub loaded: bool,
    pub records: usize,
    #[serde(flatten)]
    pub stats: EntityCacheStats,
}

/// Statistics across every kind.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub kinds: Vec<KindStats>,
    pub total_records: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    pub hit_rate: f64,
}

/// The entity caches, one per kind.
#[derive(Debug, Default)]
pub struct DataCacheRegistry {
    items: RecordCache,
    skills: RecordCache,
    achievements: RecordCache,
    recipes: RecipeCache,
}

impl DataCacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self, kind: EntityKind) -> &dyn EntityStore<Record> {
        match kind {
            EntityKind::Items => &self.items,
            EntityKind::Skills => &self.skills,
            EntityKind::Achievements => &self.achievements,
            EntityKind::Recipes => &self.recipes,
        }
    }

    /// The recipe cache, with its output/ingredient index.
    pub fn recipes(&self) -> &RecipeCache {
        &self.recipes
    }

    /// Loads `<kind>.json` from `dir` for every kind.
    ///
    /// A missing file leaves that kind unloaded. Every kind is attempted;
    /// failures are returned together afterwards.
    pub fn load_from_directory(&self, dir: &Path) -> Result<RegistryLoadReport> {
        let started = Instant::now();
        let mut report = RegistryLoadReport::default();
        let mut errors = Vec::new();

        for kind in EntityKind::ALL {
            let path = dir.join(kind.snapshot_file());
            match path.try_exists() {
                Ok(true) => {}
                Ok(false) => {
                    debug!("No snapshot for {} at {}", kind, path.display());
                    report.missing.push(kind);
                    continue;
                }
                Err(source) => {
                    warn!("Cannot stat {} snapshot at {}: {}", kind, path.display(), source);
                    errors.push(Error::SnapshotLoad { path, source });
                    continue;
                }
            }

            match self.cache(kind).load(&path) {
                Ok(summary) => report.loaded.push((kind, summary)),
                Err(e) => {
                    warn!("Failed to load {} snapshot: {}", kind, e);
                    errors.push(e);
                }
            }
        }

        if !errors.is_empty() {
            return Err(Error::SnapshotLoads(errors));
        }

        info!(
            "Loaded {} records across {} kinds from {} in {:?}",
            report.total_records(),
            report.loaded.len(),
            dir.display(),
            started.elapsed()
        );
        Ok(report)
    }

    pub fn total_hits(&self) -> u64 {
        EntityKind::ALL
            .iter()
            .map(|kind| self.cache(*kind).stats().hits)
            .sum()
    }

    pub fn total_misses(&self) -> u64 {
        EntityKind::ALL
            .iter()
            .map(|kind| self.cache(*kind).stats().misses)
            .sum()
    }

    pub fn stats(&self) -> RegistryStats {
        let kinds: Vec<KindStats> = EntityKind::ALL
            .iter()
            .map(|kind| {
                let cache = self.cache(*kind);
                KindStats {
                    kind: *kind,
                    loaded: cache.is_loaded(),
                    records: cache.len(),
                    stats: cache.stats(),
                }
            })
            .collect();

        let total_hits = kinds.iter().map(|k| k.stats.hits).sum::<u64>();
        let total_misses = kinds.iter().map(|k| k.stats.misses).sum::<u64>();
        let lookups = total_hits + total_misses;

        RegistryStats {
            total_records: kinds.iter().map(|k| k.records).sum(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                total_hits as f64 / lookups as f64
            },
            total_hits,
            total_misses,
            kinds,
        }
    }

    pub fn clear_all(&self) {
        for kind in EntityKind::ALL {
            self.cache(kind).clear();
        }
    }
}
