//! Entity identifiers and the opaque record type.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// == Entity Id ==
/// Identifier of an upstream entity: integer for most kinds, string for a few.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Reads an identifier out of a JSON value (`5` or `"abc"`).
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) if !s.is_empty() => Some(EntityId::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl EntityId {
    /// Numeric text becomes `Int`, anything else `Str`.
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        s.parse::<i64>()
            .map(EntityId::Int)
            .unwrap_or_else(|_| EntityId::Str(s.to_string()))
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_text(s))
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::Str(value.to_string())
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        match id {
            EntityId::Int(n) => Value::from(n),
            EntityId::Str(s) => Value::String(s),
        }
    }
}

/// Parses a comma-separated ID list, dropping empty segments.
pub fn parse_id_list(raw: &str) -> Vec<EntityId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EntityId::from_text)
        .collect()
}

/// Joins IDs into the comma-separated form the upstream API expects.
pub fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// == Entity Trait ==
/// Anything the caches and resolver can hold: decodable and identifiable.
pub trait Entity: DeserializeOwned + Clone + Send + Sync + 'static {
    fn entity_id(&self) -> EntityId;
}

// == Record ==
/// An upstream entity kept as opaque JSON plus its extracted identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Record {
    id: EntityId,
    body: Value,
}

impl Record {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// Top-level field lookup.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }
}

impl TryFrom<Value> for Record {
    type Error = String;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        if !body.is_object() {
            return Err("record must be a JSON object".to_string());
        }
        let id = body
            .get("id")
            .and_then(EntityId::from_json)
            .ok_or_else(|| "record has no usable `id` field".to_string())?;
        Ok(Self { id, body })
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

impl Entity for Record {
    fn entity_id(&self) -> EntityId {
        self.id.clone()
    }
}
