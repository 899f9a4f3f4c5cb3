use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_primitives::{Category, Member};
use tracing::debug;

use crate::error::RankError;
use crate::rank::{RankId, RankTable, RankTableConfig, RetiredSpec};
use crate::tier::{Standing, TierTable, TierTableConfig};

/// Both tables as they appear in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    pub ranks: RankTableConfig,
    pub tiers: TierTableConfig,
}

impl TablesConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, RankError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RankError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        crate::presets::gray_order()
    }
}

/// Resolved promotion thresholds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub minimums: BTreeMap<Category, u64>,
    pub tier: Option<Standing>,
}

impl Requirement {
    pub fn minimum(&self, category: Category) -> u64 {
        self.minimums.get(&category).copied().unwrap_or(0)
    }

    pub fn is_met(&self, points: &BTreeMap<Category, u64>, standing: Option<&Standing>) -> bool {
        let points_met = self
            .minimums
            .iter()
            .all(|(c, min)| points.get(c).copied().unwrap_or(0) >= *min);
        let tier_met = match (&self.tier, standing) {
            (None, _) => true,
            (Some(required), Some(actual)) => actual.meets(required),
            (Some(_), None) => false,
        };
        points_met && tier_met
    }
}

/// What stands between a rank and the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextRank {
    Requirement { rank: RankId, requirement: Requirement },
    /// Promotion is HR-gated; only narrative text applies.
    Notice { rank: RankId, text: String },
}

/// Derives ranks and tiers from role markers using immutable tables.
#[derive(Debug, Clone)]
pub struct RankEngine {
    ranks: RankTable,
    tiers: TierTable,
    /// Requirement to reach each rank, indexed like `ranks`.
    requirements: Vec<Requirement>,
}

impl RankEngine {
    pub fn new(config: TablesConfig) -> Result<Self, RankError> {
        let ranks = RankTable::new(config.ranks)?;
        let tiers = TierTable::new(config.tiers)?;

        let requirements = ranks
            .iter()
            .map(|(_, spec)| -> Result<Requirement, RankError> {
                let Some(req) = &spec.requirement else {
                    return Ok(Requirement::default());
                };
                let tier = match &req.tier {
                    Some(name) => {
                        let level = tiers
                            .level(name)
                            .ok_or_else(|| RankError::UnknownTier(name.clone()))?;
                        Some(tiers.standing(level, req.stars)?)
                    }
                    None => None,
                };
                Ok(Requirement {
                    minimums: req.minimums.clone(),
                    tier,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(ranks = ranks.len(), tiers = tiers.len(), "rank tables loaded");
        Ok(Self {
            ranks,
            tiers,
            requirements,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RankError> {
        Self::new(TablesConfig::from_toml_str(contents)?)
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn config(&self) -> TablesConfig {
        TablesConfig {
            ranks: self.ranks.config(),
            tiers: self.tiers.config(),
        }
    }

    /// Most senior rank whose marker the member holds. `None` is unranked.
    pub fn current_rank<M: Member + ?Sized>(&self, member: &M) -> Option<RankId> {
        self.ranks
            .markers()
            .rev()
            .find(|(_, marker)| member.has_marker(marker))
            .map(|(id, _)| id)
    }

    /// Requirement for the rank above `current`.
    ///
    /// Returns `None` for the terminal rank and for unranked members.
    pub fn next_rank_requirement(&self, current: Option<RankId>) -> Option<NextRank> {
        let current = current?;
        let next = self.ranks.next(current)?;

        if self.ranks.hr_gate().is_some_and(|gate| next >= gate) {
            let text = self
                .ranks
                .get(current)
                .and_then(|spec| spec.notice.clone())
                .unwrap_or_else(|| self.ranks.notice().to_owned());
            return Some(NextRank::Notice { rank: next, text });
        }

        let requirement = self
            .requirements
            .get(next.index())
            .cloned()
            .unwrap_or_default();
        Some(NextRank::Requirement {
            rank: next,
            requirement,
        })
    }

    /// The retirement entry, when the member holds its marker.
    pub fn retirement<M: Member + ?Sized>(&self, member: &M) -> Option<&RetiredSpec> {
        self.ranks
            .retired()
            .filter(|retired| member.has_marker(&retired.marker))
    }

    pub fn resolve_tier<M: Member + ?Sized>(&self, member: &M) -> Option<Standing> {
        self.tiers.resolve(member)
    }

    pub fn rank_name(&self, id: RankId) -> Option<&str> {
        self.ranks.name(id)
    }

    pub fn tier_label(&self, standing: &Standing) -> String {
        self.tiers.label(standing)
    }
}
