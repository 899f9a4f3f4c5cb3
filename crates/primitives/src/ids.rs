//! Scope, entity and marker identifiers.

use derive_more::{Display, From, FromStr};
use serde::{Deserialize, Serialize};

/// Isolated namespace (one community) that owns its own accounts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    FromStr,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ScopeId(pub u64);

/// Scored member within a scope.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    FromStr,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

/// Opaque role identifier attached to an entity by the directory.
///
/// The core only ever compares markers for equality; it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(String);

impl Marker {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Marker {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Marker {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for Marker {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_parse_and_display() {
        let scope: ScopeId = "1381235438563491841".parse().unwrap();
        assert_eq!(scope, ScopeId(1381235438563491841));
        assert_eq!(EntityId(7).to_string(), "7");
    }

    #[test]
    fn test_marker_from_numeric_role() {
        assert_eq!(Marker::from(1383019912762626108u64), Marker::new("1383019912762626108"));
        assert_eq!(Marker::from("Knight").as_str(), "Knight");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&EntityId(42)).unwrap();
        assert_eq!(json, "42");
        let marker: Marker = serde_json::from_str("\"Gray Knight\"").unwrap();
        assert_eq!(marker, Marker::from("Gray Knight"));
    }
}
