//! Bulk Resolver
//!
//! Serves "get by IDs" from an entity cache and fetches only the misses.

mod decode;

pub use decode::decode_one_or_many;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::entity::{Entity, EntityId, EntityStore};
use crate::error::FetchError;
use crate::transport::EntityFetcher;

/// Outcome of a bulk lookup.
#[derive(Debug)]
pub struct Resolved<T> {
    /// Found records, in request order
    pub records: Vec<T>,
    /// The fetch failure that was swallowed in favor of cached hits
    pub degraded: Option<FetchError>,
}

impl<T> Resolved<T> {
    fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            degraded: None,
        }
    }

    /// True when some IDs could not be fetched and only cached hits came back.
    pub fn is_partial(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn into_records(self) -> Vec<T> {
        self.records
    }
}

/// IDs whose lookup missed, deduplicated in first-seen order.
fn missing_ids<T>(ids: &[EntityId], lookups: &[Option<T>]) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    ids.iter()
        .zip(lookups)
        .filter(|(_, hit)| hit.is_none())
        .filter(|(id, _)| seen.insert(*id))
        .map(|(id, _)| id.clone())
        .collect()
}

/// Cache-first bulk lookup with network fallback for misses.
#[derive(Clone)]
pub struct BulkResolver {
    fetcher: Arc<dyn EntityFetcher>,
}

impl BulkResolver {
    pub fn new(fetcher: Arc<dyn EntityFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &dyn EntityFetcher {
        self.fetcher.as_ref()
    }

    /// Returns every resolvable record for `ids`, in input order.
    ///
    /// Duplicate IDs yield duplicate records. Only the cache misses go to the
    /// network, in a single request. If that request fails while the cache
    /// produced hits, the hits come back with `degraded` set; with no hits the
    /// fetch error is returned.
    pub async fn get_by_ids<T, S>(
        &self,
        cache: &S,
        endpoint: &str,
        ids: &[EntityId],
    ) -> Result<Resolved<T>, FetchError>
    where
        T: Entity,
        S: EntityStore<T> + ?Sized,
    {
        let lookups = cache.lookup_many(ids);
        let missing = missing_ids(ids, &lookups);

        if missing.is_empty() {
            return Ok(Resolved::complete(lookups.into_iter().flatten().collect()));
        }

        debug!(
            "{} of {} IDs missing from cache for {}, fetching",
            missing.len(),
            ids.len(),
            endpoint
        );

        let fetched = match self.fetch::<T>(endpoint, &missing).await {
            Ok(fetched) => fetched,
            Err(e) => {
                let hits: Vec<T> = lookups.into_iter().flatten().collect();
                if hits.is_empty() {
                    return Err(e);
                }
                warn!(
                    "Fetch for {} failed, serving {} cached records: {}",
                    endpoint,
                    hits.len(),
                    e
                );
                return Ok(Resolved {
                    records: hits,
                    degraded: Some(e),
                });
            }
        };

        let by_id: HashMap<EntityId, T> = fetched
            .into_iter()
            .map(|record| (record.entity_id(), record))
            .collect();

        let records = ids
            .iter()
            .zip(lookups)
            .filter_map(|(id, hit)| hit.or_else(|| by_id.get(id).cloned()))
            .collect();

        Ok(Resolved::complete(records))
    }

    /// Single-ID form of [`get_by_ids`](Self::get_by_ids).
    pub async fn get<T, S>(
        &self,
        cache: &S,
        endpoint: &str,
        id: &EntityId,
    ) -> Result<Option<T>, FetchError>
    where
        T: Entity,
        S: EntityStore<T> + ?Sized,
    {
        let resolved = self
            .get_by_ids(cache, endpoint, std::slice::from_ref(id))
            .await?;
        Ok(resolved.records.into_iter().next())
    }

    async fn fetch<T: Entity>(&self, endpoint: &str, ids: &[EntityId]) -> Result<Vec<T>, FetchError> {
        let body = self.fetcher.fetch_by_ids(endpoint, ids).await?;
        decode_one_or_many(&body)
    }
}
