//! Entity Cache Module
//!
//! Generic ID-indexed store warmed from newline-delimited JSON snapshots.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::entity::{Entity, EntityCacheStats, EntityId, LoadSummary, SecondaryIndex};
use crate::error::{Error, Result};

// == Entity Store Trait ==
/// Read/load surface shared by every entity cache, whatever its index type.
///
/// Object safe so a registry can hand out `&dyn EntityStore<T>` per kind.
pub trait EntityStore<T>: Send + Sync {
    /// Replaces the contents from a snapshot file.
    fn load(&self, path: &Path) -> Result<LoadSummary>;

    fn get_by_id(&self, id: &EntityId) -> Option<T>;

    /// One slot per requested ID, `None` for misses.
    fn lookup_many(&self, ids: &[EntityId]) -> Vec<Option<T>>;

    /// Present records in request order; misses are omitted.
    fn get_by_ids(&self, ids: &[EntityId]) -> Vec<T> {
        self.lookup_many(ids).into_iter().flatten().collect()
    }

    /// All IDs in snapshot order.
    fn ids(&self) -> Vec<EntityId>;

    /// Full scan in snapshot order, stopping after `limit` matches.
    fn search(&self, predicate: &dyn Fn(&T) -> bool, limit: Option<usize>) -> Vec<T>;

    /// True after any successful load, even one that produced no records.
    fn is_loaded(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    fn stats(&self) -> EntityCacheStats;
}

// == Contents ==
/// Everything swapped atomically by `load` and `clear`.
#[derive(Debug)]
struct Contents<T, X> {
    records: Vec<T>,
    by_id: HashMap<EntityId, usize>,
    index: X,
    loaded: bool,
    last_summary: LoadSummary,
    last_load: Option<DateTime<Utc>>,
}

impl<T, X: Default> Default for Contents<T, X> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            by_id: HashMap::new(),
            index: X::default(),
            loaded: false,
            last_summary: LoadSummary::default(),
            last_load: None,
        }
    }
}

// == Entity Cache ==
/// In-memory store for one entity kind.
///
/// Records live in snapshot order in a vector with an ID → position map on
/// top. `X` is an optional secondary index rebuilt on every load.
#[derive(Debug)]
pub struct EntityCache<T, X = ()> {
    contents: RwLock<Contents<T, X>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T, X> Default for EntityCache<T, X>
where
    T: Entity,
    X: SecondaryIndex<T>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, X> EntityCache<T, X>
where
    T: Entity,
    X: SecondaryIndex<T>,
{
    pub fn new() -> Self {
        Self {
            contents: RwLock::new(Contents::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Loads from any buffered reader. Decoding happens before the write lock
    /// is taken; a read error leaves the current contents untouched.
    ///
    /// Lines are split on raw bytes, so a line that is not valid UTF-8 is
    /// skipped like any other malformed line.
    pub fn load_from_reader<R: BufRead>(&self, reader: R, source: &Path) -> Result<LoadSummary> {
        let started = Instant::now();
        let mut records: Vec<T> = Vec::new();
        let mut by_id: HashMap<EntityId, usize> = HashMap::new();
        let mut skipped = 0usize;

        for (line_no, line) in reader.split(b'\n').enumerate() {
            let line = line.map_err(|source_err| Error::SnapshotLoad {
                path: source.to_path_buf(),
                source: source_err,
            })?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<T>(&line) {
                Ok(record) => match by_id.get(&record.entity_id()) {
                    // Later duplicates replace the earlier record in place.
                    Some(&pos) => records[pos] = record,
                    None => {
                        by_id.insert(record.entity_id(), records.len());
                        records.push(record);
                    }
                },
                Err(e) => {
                    skipped += 1;
                    debug!(
                        "Skipping malformed line {} in {}: {}",
                        line_no + 1,
                        source.display(),
                        e
                    );
                }
            }
        }

        let index = X::build(&records);
        let summary = LoadSummary {
            loaded: records.len(),
            skipped,
            duration: started.elapsed(),
        };

        *self.contents.write() = Contents {
            records,
            by_id,
            index,
            loaded: true,
            last_summary: summary,
            last_load: Some(Utc::now()),
        };

        info!(
            "Loaded {} records from {} ({} skipped) in {:?}",
            summary.loaded,
            source.display(),
            summary.skipped,
            summary.duration
        );
        Ok(summary)
    }

    /// Runs `f` against the secondary index under the read lock.
    pub fn with_index<R>(&self, f: impl FnOnce(&X) -> R) -> R {
        f(&self.contents.read().index)
    }

    fn record_lookup(&self, found: bool) {
        let counter = if found { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl<T, X> EntityStore<T> for EntityCache<T, X>
where
    T: Entity,
    X: SecondaryIndex<T>,
{
    fn load(&self, path: &Path) -> Result<LoadSummary> {
        let file = File::open(path).map_err(|source| Error::SnapshotLoad {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_from_reader(BufReader::new(file), path)
    }

    fn get_by_id(&self, id: &EntityId) -> Option<T> {
        let contents = self.contents.read();
        let found = contents.by_id.get(id).map(|&pos| contents.records[pos].clone());
        self.record_lookup(found.is_some());
        found
    }

    fn lookup_many(&self, ids: &[EntityId]) -> Vec<Option<T>> {
        let contents = self.contents.read();
        ids.iter()
            .map(|id| {
                let found = contents.by_id.get(id).map(|&pos| contents.records[pos].clone());
                self.record_lookup(found.is_some());
                found
            })
            .collect()
    }

    fn ids(&self) -> Vec<EntityId> {
        self.contents
            .read()
            .records
            .iter()
            .map(Entity::entity_id)
            .collect()
    }

    fn search(&self, predicate: &dyn Fn(&T) -> bool, limit: Option<usize>) -> Vec<T> {
        let contents = self.contents.read();
        contents
            .records
            .iter()
            .filter(|record| predicate(record))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    fn is_loaded(&self) -> bool {
        self.contents.read().loaded
    }

    fn len(&self) -> usize {
        self.contents.read().records.len()
    }

    fn clear(&self) {
        *self.contents.write() = Contents::default();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> EntityCacheStats {
        let contents = self.contents.read();
        EntityCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: 0,
            loaded_records: contents.records.len(),
            skipped_lines: contents.last_summary.skipped,
            load_duration: contents.last_summary.duration,
            last_load: contents.last_load,
        }
    }
}
