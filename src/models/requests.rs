//! Request DTOs for the HTTP API
//!
//! Query strings accepted by the lookup endpoints.

use serde::Deserialize;

use crate::entity::{parse_id_list, EntityId};
use crate::error::{Error, Result};

/// Query for `GET /v2/:kind`.
///
/// Without `ids` the endpoint lists every ID; with `ids=1,2,3` it returns the
/// records in that order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdsQuery {
    #[serde(default)]
    pub ids: Option<String>,
}

impl IdsQuery {
    /// Parsed IDs, `None` when the parameter is absent.
    pub fn parsed(&self) -> Result<Option<Vec<EntityId>>> {
        let Some(raw) = &self.ids else {
            return Ok(None);
        };
        let ids = parse_id_list(raw);
        if ids.is_empty() {
            return Err(Error::InvalidRequest("`ids` is empty".to_string()));
        }
        Ok(Some(ids))
    }
}

/// Query for `GET /recipes/search`: exactly one of `output` or `input`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeQuery {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub input: Option<String>,
}

/// Which recipe index to consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeLookup {
    Output(EntityId),
    Input(EntityId),
}

impl RecipeQuery {
    pub fn validate(&self) -> Result<RecipeLookup> {
        match (&self.output, &self.input) {
            (Some(output), None) => Ok(RecipeLookup::Output(parse_single(output)?)),
            (None, Some(input)) => Ok(RecipeLookup::Input(parse_single(input)?)),
            _ => Err(Error::InvalidRequest(
                "exactly one of `output` or `input` is required".to_string(),
            )),
        }
    }
}

fn parse_single(raw: &str) -> Result<EntityId> {
    let mut ids = parse_id_list(raw);
    if ids.len() != 1 {
        return Err(Error::InvalidRequest(format!("expected one item ID, got `{raw}`")));
    }
    Ok(ids.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_query_absent() {
        assert!(IdsQuery::default().parsed().unwrap().is_none());
    }

    #[test]
    fn test_ids_query_parsed() {
        let query: IdsQuery = serde_json::from_str(r#"{"ids": "3,1,2"}"#).unwrap();
        assert_eq!(
            query.parsed().unwrap(),
            Some(vec![EntityId::Int(3), EntityId::Int(1), EntityId::Int(2)])
        );
    }

    #[test]
    fn test_ids_query_empty_is_invalid() {
        let query = IdsQuery {
            ids: Some(" , ".to_string()),
        };
        assert!(query.parsed().is_err());
    }

    #[test]
    fn test_recipe_query_requires_exactly_one() {
        let both = RecipeQuery {
            output: Some("1".to_string()),
            input: Some("2".to_string()),
        };
        assert!(both.validate().is_err());
        assert!(RecipeQuery::default().validate().is_err());

        let output = RecipeQuery {
            output: Some("19721".to_string()),
            input: None,
        };
        assert_eq!(output.validate().unwrap(), RecipeLookup::Output(EntityId::Int(19721)));
    }
}
