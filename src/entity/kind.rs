//! Entity kinds served by the cache.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

/// The entity kinds with snapshot-backed caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Items,
    Skills,
    Achievements,
    Recipes,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Items,
        EntityKind::Skills,
        EntityKind::Achievements,
        EntityKind::Recipes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Items => "items",
            EntityKind::Skills => "skills",
            EntityKind::Achievements => "achievements",
            EntityKind::Recipes => "recipes",
        }
    }

    /// API path relative to the base URL.
    pub fn endpoint(self) -> String {
        format!("v2/{}", self.as_str())
    }

    /// Snapshot file name inside the snapshot directory.
    pub fn snapshot_file(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}
