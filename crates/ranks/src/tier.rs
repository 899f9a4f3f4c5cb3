//! Tier ladder: ordered base tiers plus star modifiers with per-tier eligibility.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tally_primitives::{Marker, Member};

use crate::error::RankError;

/// Position of a base tier in its table, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TierLevel(usize);

impl TierLevel {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier#{}", self.0)
    }
}

/// Validated base tier × star count.
///
/// Only a [`TierTable`] hands these out, so `stars` is either zero or a count the table
/// allows on `base`. Ordering is by base tier, then stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Standing {
    base: TierLevel,
    stars: u8,
}

impl Standing {
    pub const fn base(&self) -> TierLevel {
        self.base
    }

    pub const fn stars(&self) -> u8 {
        self.stars
    }

    /// Whether this standing is at least `required`.
    pub fn meets(&self, required: &Standing) -> bool {
        self >= required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTier {
    pub name: String,
    pub marker: Marker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarModifier {
    pub name: String,
    pub marker: Marker,
    pub count: u8,
    /// Base tier names this modifier may be combined with.
    pub eligible: Vec<String>,
}

/// Serializable tier table, lowest base tier first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTableConfig {
    pub bases: Vec<BaseTier>,
    #[serde(default)]
    pub stars: Vec<StarModifier>,
}

#[derive(Debug, Clone)]
struct Star {
    spec: StarModifier,
    eligible: BTreeSet<TierLevel>,
}

/// Markers to change when moving a member to a new standing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAssignment {
    pub standing: Standing,
    /// Tier and star markers the member holds that are not part of the new standing.
    pub revoke: Vec<Marker>,
    /// Every marker the new standing consists of.
    pub grant: Vec<Marker>,
}

/// Immutable tier table.
#[derive(Debug, Clone)]
pub struct TierTable {
    bases: Vec<BaseTier>,
    /// Sorted by descending count so resolution prefers the larger modifier.
    stars: Vec<Star>,
}

impl TierTable {
    pub fn new(config: TierTableConfig) -> Result<Self, RankError> {
        if config.bases.is_empty() {
            return Err(RankError::EmptyTable("tier"));
        }
        let mut seen = BTreeSet::new();
        for base in &config.bases {
            if !seen.insert(base.name.as_str()) {
                return Err(RankError::DuplicateName(base.name.clone()));
            }
        }

        let mut table = Self {
            bases: config.bases,
            stars: Vec::with_capacity(config.stars.len()),
        };

        let mut counts = BTreeSet::new();
        for spec in config.stars {
            if spec.count == 0 || !counts.insert(spec.count) {
                return Err(RankError::UnknownStars(spec.count));
            }
            let eligible = spec
                .eligible
                .iter()
                .map(|name| {
                    table
                        .level(name)
                        .ok_or_else(|| RankError::UnknownTier(name.clone()))
                })
                .collect::<Result<BTreeSet<_>, _>>()?;
            table.stars.push(Star { spec, eligible });
        }
        table.stars.sort_by(|a, b| b.spec.count.cmp(&a.spec.count));

        Ok(table)
    }

    pub fn config(&self) -> TierTableConfig {
        let mut stars: Vec<_> = self.stars.iter().map(|s| s.spec.clone()).collect();
        stars.sort_by_key(|s| s.count);
        TierTableConfig {
            bases: self.bases.clone(),
            stars,
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Base tiers with their levels, lowest first.
    pub fn bases(&self) -> impl DoubleEndedIterator<Item = (TierLevel, &BaseTier)> + '_ {
        self.bases
            .iter()
            .enumerate()
            .map(|(i, base)| (TierLevel(i), base))
    }

    pub fn level(&self, name: &str) -> Option<TierLevel> {
        self.bases
            .iter()
            .position(|b| b.name == name)
            .map(TierLevel)
    }

    pub fn base(&self, level: TierLevel) -> Option<&BaseTier> {
        self.bases.get(level.0)
    }

    pub fn star(&self, count: u8) -> Option<&StarModifier> {
        self.stars
            .iter()
            .find(|s| s.spec.count == count)
            .map(|s| &s.spec)
    }

    /// Build a validated standing. Zero stars is always allowed.
    pub fn standing(&self, base: TierLevel, stars: u8) -> Result<Standing, RankError> {
        let name = self
            .base(base)
            .ok_or_else(|| RankError::UnknownTier(base.to_string()))?
            .name
            .clone();
        if stars == 0 {
            return Ok(Standing { base, stars });
        }
        let star = self
            .stars
            .iter()
            .find(|s| s.spec.count == stars)
            .ok_or(RankError::UnknownStars(stars))?;
        if !star.eligible.contains(&base) {
            return Err(RankError::InvalidStars { tier: name, stars });
        }
        Ok(Standing { base, stars })
    }

    /// Highest base tier whose marker the member holds, with the largest star modifier
    /// that is both held and eligible on that base. Ineligible stars count as none.
    pub fn resolve<M: Member + ?Sized>(&self, member: &M) -> Option<Standing> {
        let (base, _) = self
            .bases()
            .rev()
            .find(|(_, tier)| member.has_marker(&tier.marker))?;
        let stars = self
            .stars
            .iter()
            .find(|s| s.eligible.contains(&base) && member.has_marker(&s.spec.marker))
            .map_or(0, |s| s.spec.count);
        Some(Standing { base, stars })
    }

    /// Display label, e.g. `Middle-Tier [ ⁑ ]`.
    pub fn label(&self, standing: &Standing) -> String {
        let base = self.base(standing.base).map_or("?", |b| b.name.as_str());
        match self.star(standing.stars) {
            Some(star) => format!("{base} {}", star.name),
            None => base.to_owned(),
        }
    }

    /// Every base and star marker the table knows.
    pub fn markers(&self) -> impl Iterator<Item = &Marker> + '_ {
        self.bases
            .iter()
            .map(|b| &b.marker)
            .chain(self.stars.iter().map(|s| &s.spec.marker))
    }

    /// Plan moving `member` to `tier` with an optional star count.
    pub fn assign<M: Member + ?Sized>(
        &self,
        member: &M,
        tier: &str,
        stars: Option<u8>,
    ) -> Result<TierAssignment, RankError> {
        let base = self
            .level(tier)
            .ok_or_else(|| RankError::UnknownTier(tier.to_owned()))?;
        let standing = self.standing(base, stars.unwrap_or(0))?;

        let mut grant = Vec::with_capacity(2);
        if let Some(base) = self.base(base) {
            grant.push(base.marker.clone());
        }
        if let Some(star) = self.star(standing.stars) {
            grant.push(star.marker.clone());
        }
        let revoke = self
            .markers()
            .filter(|m| member.has_marker(m) && !grant.contains(m))
            .cloned()
            .collect();

        Ok(TierAssignment {
            standing,
            revoke,
            grant,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tally_primitives::{EntityId, MemberRecord};

    use super::*;

    fn table() -> TierTable {
        let base = |name: &str| BaseTier {
            name: name.to_owned(),
            marker: Marker::from(name),
        };
        TierTable::new(TierTableConfig {
            bases: vec![base("Low"), base("Middle"), base("High"), base("Legend")],
            stars: vec![
                StarModifier {
                    name: "[2]".into(),
                    marker: "two".into(),
                    count: 2,
                    eligible: vec!["Low".into(), "Middle".into(), "High".into()],
                },
                StarModifier {
                    name: "[3]".into(),
                    marker: "three".into(),
                    count: 3,
                    eligible: vec!["Low".into(), "Middle".into(), "High".into()],
                },
            ],
        })
        .unwrap()
    }

    fn member(markers: &[&str]) -> MemberRecord {
        MemberRecord::new(EntityId(1), "m").with_markers(markers.iter().copied())
    }

    #[test]
    fn test_resolve_highest_base() {
        let table = table();
        let standing = table.resolve(&member(&["Low", "High"])).unwrap();
        assert_eq!(standing.base(), table.level("High").unwrap());
        assert_eq!(standing.stars(), 0);
        assert!(table.resolve(&member(&["two"])).is_none());
    }

    #[test]
    fn test_resolve_prefers_larger_star() {
        let table = table();
        let standing = table.resolve(&member(&["Middle", "two", "three"])).unwrap();
        assert_eq!(standing.stars(), 3);
        assert_eq!(table.label(&standing), "Middle [3]");
    }

    #[test]
    fn test_ineligible_star_is_ignored() {
        let table = table();
        let standing = table.resolve(&member(&["Legend", "three"])).unwrap();
        assert_eq!(standing.base(), table.level("Legend").unwrap());
        assert_eq!(standing.stars(), 0);
        assert_eq!(table.label(&standing), "Legend");
    }

    #[test]
    fn test_standing_validation() {
        let table = table();
        let legend = table.level("Legend").unwrap();
        assert_matches!(
            table.standing(legend, 2),
            Err(RankError::InvalidStars { stars: 2, .. })
        );
        assert_matches!(
            table.standing(legend, 4),
            Err(RankError::UnknownStars(4))
        );
        assert!(table.standing(legend, 0).is_ok());
    }

    #[test]
    fn test_standing_order() {
        let table = table();
        let low = table.level("Low").unwrap();
        let middle = table.level("Middle").unwrap();
        let low3 = table.standing(low, 3).unwrap();
        let middle0 = table.standing(middle, 0).unwrap();
        let middle2 = table.standing(middle, 2).unwrap();

        assert!(middle0 > low3);
        assert!(middle2.meets(&middle0));
        assert!(!middle0.meets(&middle2));
    }

    #[test]
    fn test_assign_plan() {
        let table = table();
        let current = member(&["Low", "three", "Knight"]);

        let plan = table.assign(&current, "Middle", Some(2)).unwrap();
        assert_eq!(plan.grant, vec![Marker::from("Middle"), Marker::from("two")]);
        assert_eq!(plan.revoke, vec![Marker::from("Low"), Marker::from("three")]);

        assert_matches!(
            table.assign(&current, "Legend", Some(3)),
            Err(RankError::InvalidStars { .. })
        );
        assert_matches!(
            table.assign(&current, "Mythic", None),
            Err(RankError::UnknownTier(name)) if name == "Mythic"
        );
    }

    #[test]
    fn test_table_validation() {
        let dup = TierTableConfig {
            bases: vec![
                BaseTier {
                    name: "A".into(),
                    marker: "a".into(),
                },
                BaseTier {
                    name: "A".into(),
                    marker: "b".into(),
                },
            ],
            stars: vec![],
        };
        assert_matches!(TierTable::new(dup), Err(RankError::DuplicateName(_)));
        assert_matches!(
            TierTable::new(TierTableConfig::default()),
            Err(RankError::EmptyTable("tier"))
        );
    }
}
