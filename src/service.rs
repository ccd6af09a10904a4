//! Data Service
//!
//! The lookup operations consumers call, built on an injected registry and
//! resolver.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::entity::{EntityId, EntityKind, EntityStore, RecipeIndex, Record};
use crate::error::{Error, Result};
use crate::registry::DataCacheRegistry;
use crate::resolver::{BulkResolver, Resolved};

/// Cache-side search criteria. All set criteria must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring of the record's `name`
    pub name: Option<String>,
    /// Top-level field that must be present
    pub field: Option<String>,
    /// Value `field` must equal; strings compare case-insensitively
    pub value: Option<String>,
    pub limit: Option<usize>,
}

impl SearchFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if self.value.is_some() && self.field.is_none() {
            return Err(Error::InvalidRequest(
                "`value` requires `field`".to_string(),
            ));
        }
        Ok(())
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(needle) = &self.name {
            let needle = needle.to_lowercase();
            let found = record
                .name()
                .is_some_and(|name| name.to_lowercase().contains(&needle));
            if !found {
                return false;
            }
        }

        if let Some(field) = &self.field {
            let Some(actual) = record.field(field) else {
                return false;
            };
            if let Some(expected) = &self.value {
                return value_matches(actual, expected);
            }
        }

        true
    }
}

fn value_matches(actual: &Value, expected: &str) -> bool {
    match actual {
        Value::String(s) => s.eq_ignore_ascii_case(expected),
        Value::Array(items) => items.iter().any(|item| value_matches(item, expected)),
        other => other.to_string() == expected,
    }
}

/// Entry point for consumers: bulk lookups, ID listing, search and recipe
/// queries.
#[derive(Clone)]
pub struct DataService {
    registry: Arc<DataCacheRegistry>,
    resolver: BulkResolver,
}

impl DataService {
    pub fn new(registry: Arc<DataCacheRegistry>, resolver: BulkResolver) -> Self {
        Self { registry, resolver }
    }

    pub fn registry(&self) -> &DataCacheRegistry {
        &self.registry
    }

    pub async fn get_by_id(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Record>> {
        let record = self
            .resolver
            .get(self.registry.cache(kind), &kind.endpoint(), id)
            .await?;
        Ok(record)
    }

    pub async fn get_by_ids(&self, kind: EntityKind, ids: &[EntityId]) -> Result<Resolved<Record>> {
        let resolved = self
            .resolver
            .get_by_ids(self.registry.cache(kind), &kind.endpoint(), ids)
            .await?;
        Ok(resolved)
    }

    /// Snapshot order when the kind is loaded, otherwise the upstream list.
    pub async fn list_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>> {
        let cache = self.registry.cache(kind);
        if cache.is_loaded() {
            return Ok(cache.ids());
        }
        Ok(self.resolver.fetcher().fetch_ids(&kind.endpoint()).await?)
    }

    /// Scans the loaded records of `kind`.
    pub fn search(&self, kind: EntityKind, filter: &SearchFilter) -> Result<Vec<Record>> {
        filter.validate()?;
        let cache = self.registry.cache(kind);
        if !cache.is_loaded() {
            return Err(Error::NotLoaded(kind));
        }
        Ok(cache.search(&|record: &Record| filter.matches(record), filter.limit))
    }

    /// Recipes producing `item_id`.
    pub fn recipes_by_output(&self, item_id: &EntityId) -> Result<Vec<Record>> {
        self.recipes_via(|index| index.by_output(item_id).to_vec())
    }

    /// Recipes consuming `item_id`.
    pub fn recipes_by_ingredient(&self, item_id: &EntityId) -> Result<Vec<Record>> {
        self.recipes_via(|index| index.by_ingredient(item_id).to_vec())
    }

    fn recipes_via(&self, select: impl FnOnce(&RecipeIndex) -> Vec<EntityId>) -> Result<Vec<Record>> {
        let recipes = self.registry.recipes();
        if !recipes.is_loaded() {
            return Err(Error::NotLoaded(EntityKind::Recipes));
        }
        let ids = recipes.with_index(select);
        Ok(recipes.get_by_ids(&ids))
    }
}
