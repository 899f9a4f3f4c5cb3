//! Rank ladder, lowest seniority first.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tally_primitives::{Category, Marker};

use crate::error::RankError;

pub const DEFAULT_NOTICE: &str = "From this rank onwards, promotions are decided by HR.";

/// Position of a rank in its table. Higher is more senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RankId(usize);

impl RankId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank#{}", self.0)
    }
}

/// Thresholds for being promoted *into* a rank, as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSpec {
    #[serde(default, with = "category_map")]
    pub minimums: BTreeMap<Category, u64>,
    /// Base tier name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub stars: u8,
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

/// Category-keyed maps go through the category's short key, whatever the format's key rules.
mod category_map {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use tally_primitives::Category;

    pub(super) fn serialize<S: Serializer>(
        map: &BTreeMap<Category, u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(c, v)| (c.to_string(), v)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Category, u64>, D::Error> {
        BTreeMap::<String, u64>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                key.parse::<Category>()
                    .map(|c| (c, value))
                    .map_err(|_| D::Error::custom(format!("unknown category `{key}`")))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSpec {
    pub name: String,
    /// Role marker identifying the rank; defaults to the rank name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<RequirementSpec>,
    /// Narrative shown instead of thresholds once promotions are HR-gated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl RankSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: None,
            requirement: None,
            notice: None,
        }
    }

    pub fn with_requirement(mut self, requirement: RequirementSpec) -> Self {
        self.requirement = Some(requirement);
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// Members holding this marker have left the ladder: they show under `name` and get
/// `notice` instead of promotion guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetiredSpec {
    pub marker: Marker,
    #[serde(default = "default_retired_name")]
    pub name: String,
    pub notice: String,
}

fn default_retired_name() -> String {
    "Retired".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTableConfig {
    pub ranks: Vec<RankSpec>,
    /// First rank whose promotion is decided by people rather than thresholds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_gate: Option<String>,
    #[serde(default = "default_notice")]
    pub notice: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retired: Option<RetiredSpec>,
}

fn default_notice() -> String {
    DEFAULT_NOTICE.to_owned()
}

/// Immutable rank table.
#[derive(Debug, Clone)]
pub struct RankTable {
    ranks: Vec<RankSpec>,
    markers: Vec<Marker>,
    hr_gate: Option<RankId>,
    notice: String,
    retired: Option<RetiredSpec>,
}

impl RankTable {
    pub fn new(config: RankTableConfig) -> Result<Self, RankError> {
        if config.ranks.is_empty() {
            return Err(RankError::EmptyTable("rank"));
        }
        let mut seen = BTreeSet::new();
        for rank in &config.ranks {
            if !seen.insert(rank.name.as_str()) {
                return Err(RankError::DuplicateName(rank.name.clone()));
            }
        }

        let markers = config
            .ranks
            .iter()
            .map(|r| r.marker.clone().unwrap_or_else(|| Marker::from(r.name.as_str())))
            .collect();
        let hr_gate = match &config.hr_gate {
            Some(name) => Some(
                config
                    .ranks
                    .iter()
                    .position(|r| &r.name == name)
                    .map(RankId)
                    .ok_or_else(|| RankError::UnknownRank(name.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            ranks: config.ranks,
            markers,
            hr_gate,
            notice: config.notice,
            retired: config.retired,
        })
    }

    pub fn config(&self) -> RankTableConfig {
        RankTableConfig {
            ranks: self.ranks.clone(),
            hr_gate: self.hr_gate.and_then(|id| self.name(id)).map(str::to_owned),
            notice: self.notice.clone(),
            retired: self.retired.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (RankId, &RankSpec)> + '_ {
        self.ranks.iter().enumerate().map(|(i, r)| (RankId(i), r))
    }

    pub fn get(&self, id: RankId) -> Option<&RankSpec> {
        self.ranks.get(id.0)
    }

    pub fn name(&self, id: RankId) -> Option<&str> {
        self.get(id).map(|r| r.name.as_str())
    }

    pub fn marker(&self, id: RankId) -> Option<&Marker> {
        self.markers.get(id.0)
    }

    /// Markers with their ranks, lowest first.
    pub fn markers(&self) -> impl DoubleEndedIterator<Item = (RankId, &Marker)> + '_ {
        self.markers.iter().enumerate().map(|(i, m)| (RankId(i), m))
    }

    pub fn id(&self, name: &str) -> Option<RankId> {
        self.ranks.iter().position(|r| r.name == name).map(RankId)
    }

    pub fn next(&self, id: RankId) -> Option<RankId> {
        let next = RankId(id.0 + 1);
        (next.0 < self.ranks.len()).then_some(next)
    }

    pub fn terminal(&self) -> RankId {
        RankId(self.ranks.len().saturating_sub(1))
    }

    pub fn hr_gate(&self) -> Option<RankId> {
        self.hr_gate
    }

    /// Table-wide HR notice.
    pub fn notice(&self) -> &str {
        &self.notice
    }

    pub fn retired(&self) -> Option<&RetiredSpec> {
        self.retired.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn config() -> RankTableConfig {
        RankTableConfig {
            ranks: vec![
                RankSpec::new("Recruit"),
                RankSpec {
                    marker: Some(Marker::from(42u64)),
                    ..RankSpec::new("Veteran")
                },
                RankSpec::new("Officer"),
            ],
            hr_gate: Some("Officer".into()),
            notice: default_notice(),
            retired: None,
        }
    }

    #[test]
    fn test_table_lookup() {
        let table = RankTable::new(config()).unwrap();
        assert_eq!(table.len(), 3);
        let veteran = table.id("Veteran").unwrap();
        assert_eq!(table.marker(veteran), Some(&Marker::from("42")));
        assert_eq!(table.marker(table.id("Recruit").unwrap()), Some(&Marker::from("Recruit")));
        assert_eq!(table.next(veteran), table.id("Officer"));
        assert_eq!(table.next(table.terminal()), None);
        assert_eq!(table.hr_gate(), table.id("Officer"));
    }

    #[test]
    fn test_table_validation() {
        let mut bad_gate = config();
        bad_gate.hr_gate = Some("General".into());
        assert_matches!(RankTable::new(bad_gate), Err(RankError::UnknownRank(_)));

        let mut dup = config();
        dup.ranks.push(RankSpec::new("Recruit"));
        assert_matches!(RankTable::new(dup), Err(RankError::DuplicateName(name)) if name == "Recruit");
    }

    #[test]
    fn test_retired_marker_defaults_name() {
        let parsed: RetiredSpec =
            toml::from_str("marker = \"9\"\nnotice = \"Gone fishing\"").unwrap();
        assert_eq!(parsed.name, "Retired");
        assert_eq!(parsed.marker, Marker::from(9u64));

        let mut config = config();
        config.retired = Some(parsed.clone());
        let table = RankTable::new(config).unwrap();
        assert_eq!(table.retired(), Some(&parsed));
    }

    #[test]
    fn test_config_roundtrip() {
        let table = RankTable::new(config()).unwrap();
        assert_eq!(table.config(), config());
    }
}
