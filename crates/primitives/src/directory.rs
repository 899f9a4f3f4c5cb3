//! Capability traits for the external identity/role directory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Debug;

use async_trait::async_trait;
use auto_impl::auto_impl;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::ids::{EntityId, Marker, ScopeId};

/// Read-only view of a directory member.
///
/// Implemented by whatever the directory hands back; tally never takes ownership of
/// the underlying record and never mutates its markers.
#[auto_impl(&, Box, Arc)]
pub trait Member: Debug + Send + Sync {
    fn id(&self) -> EntityId;
    fn display_name(&self) -> &str;
    fn has_marker(&self, marker: &Marker) -> bool;
}

/// Identity/role directory collaborator.
///
/// Each call is a suspension point: real directories are remote.
#[async_trait]
pub trait Directory: Send + Sync {
    type Member: Member + Clone + 'static;

    /// Resolve a single id. `None` means the entity is absent from the scope.
    async fn lookup(&self, scope: ScopeId, id: EntityId) -> Option<Self::Member>;

    /// All members of a scope, in a stable order.
    async fn members(&self, scope: ScopeId) -> Vec<Self::Member>;
}

/// Plain member record, used by [`StaticDirectory`] and directory snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: EntityId,
    pub display_name: String,
    #[serde(default)]
    pub markers: BTreeSet<Marker>,
}

impl MemberRecord {
    pub fn new(id: EntityId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            markers: BTreeSet::new(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<Marker>) -> Self {
        self.markers.insert(marker.into());
        self
    }

    pub fn with_markers<I, M>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Marker>,
    {
        self.markers.extend(markers.into_iter().map(Into::into));
        self
    }
}

impl Member for MemberRecord {
    fn id(&self) -> EntityId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn has_marker(&self, marker: &Marker) -> bool {
        self.markers.contains(marker)
    }
}

/// Serializable directory contents: scope → members.
pub type DirectorySnapshot = BTreeMap<ScopeId, Vec<MemberRecord>>;

/// In-memory directory (tests, offline tooling).
///
/// Members are kept ordered by id so `members` is deterministic.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    scopes: RwLock<HashMap<ScopeId, BTreeMap<EntityId, MemberRecord>>>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let directory = Self::new();
        for (scope, members) in snapshot {
            for member in members {
                directory.insert(scope, member);
            }
        }
        directory
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        self.scopes
            .read()
            .iter()
            .map(|(scope, members)| (*scope, members.values().cloned().collect()))
            .collect()
    }

    /// Insert or replace a member. Returns the previous record, if any.
    pub fn insert(&self, scope: ScopeId, member: MemberRecord) -> Option<MemberRecord> {
        self.scopes
            .write()
            .entry(scope)
            .or_default()
            .insert(member.id, member)
    }

    pub fn remove(&self, scope: ScopeId, id: EntityId) -> Option<MemberRecord> {
        self.scopes.write().get_mut(&scope)?.remove(&id)
    }

    pub fn len(&self, scope: ScopeId) -> usize {
        self.scopes.read().get(&scope).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, scope: ScopeId) -> bool {
        self.len(scope) == 0
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    type Member = MemberRecord;

    async fn lookup(&self, scope: ScopeId, id: EntityId) -> Option<MemberRecord> {
        self.scopes.read().get(&scope)?.get(&id).cloned()
    }

    async fn members(&self, scope: ScopeId) -> Vec<MemberRecord> {
        self.scopes
            .read()
            .get(&scope)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPE: ScopeId = ScopeId(1);

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let directory = StaticDirectory::new();
        directory.insert(SCOPE, MemberRecord::new(EntityId(10), "alice").with_marker("Knight"));

        let alice = directory.lookup(SCOPE, EntityId(10)).await.unwrap();
        assert_eq!(alice.display_name(), "alice");
        assert!(alice.has_marker(&Marker::from("Knight")));
        assert!(!alice.has_marker(&Marker::from("Seeker")));

        assert!(directory.lookup(SCOPE, EntityId(11)).await.is_none());
        assert!(directory.lookup(ScopeId(2), EntityId(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_static_directory_members_ordered() {
        let directory = StaticDirectory::new();
        for id in [30u64, 10, 20] {
            directory.insert(SCOPE, MemberRecord::new(EntityId(id), format!("m{id}")));
        }

        let ids: Vec<_> = directory
            .members(SCOPE)
            .await
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![EntityId(10), EntityId(20), EntityId(30)]);
        assert!(directory.members(ScopeId(9)).await.is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let directory = StaticDirectory::new();
        directory.insert(SCOPE, MemberRecord::new(EntityId(1), "a").with_markers(["x", "y"]));
        directory.insert(ScopeId(2), MemberRecord::new(EntityId(2), "b"));

        let json = serde_json::to_string(&directory.snapshot()).unwrap();
        let restored = StaticDirectory::from_snapshot(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.len(SCOPE), 1);
        assert_eq!(restored.len(ScopeId(2)), 1);
        assert!(restored.remove(SCOPE, EntityId(1)).is_some());
        assert!(restored.is_empty(SCOPE));
    }
}
