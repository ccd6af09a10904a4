//! Secondary indices rebuilt alongside an entity cache's primary map.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::{EntityId, Record};

/// An auxiliary lookup structure derived from the full record set.
///
/// Built from scratch on every load and swapped in under the same write lock
/// as the primary map, so readers never see a stale or partial index.
pub trait SecondaryIndex<T>: Default + Send + Sync {
    fn build(records: &[T]) -> Self;
}

impl<T> SecondaryIndex<T> for () {
    fn build(_records: &[T]) -> Self {}
}

// == Recipe Index ==
/// Recipe lookup by produced item and by consumed item.
#[derive(Debug, Default, Clone)]
pub struct RecipeIndex {
    by_output: HashMap<EntityId, Vec<EntityId>>,
    by_ingredient: HashMap<EntityId, Vec<EntityId>>,
}

impl RecipeIndex {
    /// Recipes whose output is `item_id`, in snapshot order.
    pub fn by_output(&self, item_id: &EntityId) -> &[EntityId] {
        self.by_output.get(item_id).map_or(&[], Vec::as_slice)
    }

    /// Recipes that consume `item_id`, in snapshot order.
    pub fn by_ingredient(&self, item_id: &EntityId) -> &[EntityId] {
        self.by_ingredient.get(item_id).map_or(&[], Vec::as_slice)
    }

    pub fn output_count(&self) -> usize {
        self.by_output.len()
    }

    pub fn ingredient_count(&self) -> usize {
        self.by_ingredient.len()
    }
}

/// Ingredient entries carry `item_id`, or `id` with a `type` of `Item`.
fn ingredient_item(ingredient: &Value) -> Option<EntityId> {
    if let Some(id) = ingredient.get("item_id").and_then(EntityId::from_json) {
        return Some(id);
    }
    let is_item = ingredient
        .get("type")
        .and_then(Value::as_str)
        .map_or(true, |t| t == "Item");
    if is_item {
        ingredient.get("id").and_then(EntityId::from_json)
    } else {
        None
    }
}

impl SecondaryIndex<Record> for RecipeIndex {
    fn build(records: &[Record]) -> Self {
        let mut index = RecipeIndex::default();

        for recipe in records {
            if let Some(output) = recipe.field("output_item_id").and_then(EntityId::from_json) {
                index
                    .by_output
                    .entry(output)
                    .or_default()
                    .push(recipe.id().clone());
            }

            let ingredients = recipe
                .field("ingredients")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            for item in ingredients.iter().filter_map(ingredient_item) {
                let recipes = index.by_ingredient.entry(item).or_default();
                // A recipe listing the same item twice is indexed once.
                if recipes.last() != Some(recipe.id()) {
                    recipes.push(recipe.id().clone());
                }
            }
        }

        index
    }
}
