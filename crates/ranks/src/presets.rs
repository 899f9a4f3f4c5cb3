//! Built-in tables for The Gray Order.

use std::collections::BTreeMap;

use tally_primitives::{Category, Marker};

use crate::engine::TablesConfig;
use crate::rank::{DEFAULT_NOTICE, RankSpec, RankTableConfig, RequirementSpec, RetiredSpec};
use crate::tier::{BaseTier, StarModifier, TierTableConfig};

const RANKS: [&str; 14] = [
    "Initiate",
    "Acolyte",
    "Disciple",
    "Seeker",
    "Knight",
    "Gray Knight",
    "Silver Knight",
    "Master - On trial",
    "Grandmaster",
    "Master of Balance",
    "Gray Lord",
    "Ashen Lord",
    "Gray Emperor",
    "Elder Gray Emperor",
];

const HR_GATE: &str = "Master - On trial";

const COUNCIL_NOTICE: &str = "Part of the council of The Grey Order";
const EMPEROR_NOTICE: &str = "Owner and Emperor of the Grey Order";

const RETIRED_ROLE: u64 = 1381562883803971605;
const RETIRED_NOTICE: &str = "The legends will always be remembered";

/// (name, role id), lowest first.
const TIERS: [(&str, u64); 7] = [
    ("Low-Tier", 1383019912762626108),
    ("Middle-Tier", 1383020382071820328),
    ("High-Tier", 1383020440993271839),
    ("Elite-Tier", 1383878896578986086),
    ("Celestial-Tier", 1383882358343733330),
    ("★ Ashenlight-Tier", 1383882778474578080),
    ("✩ Legend-Tier", 1383883524783996998),
];

/// (name, role id, count).
const STARS: [(&str, u64, u8); 2] = [
    ("[ ⁑ ]", 1384186134891855872, 2),
    ("[ ⁂ ]", 1384516311354445965, 3),
];

const STAR_ELIGIBLE: [&str; 5] = [
    "Low-Tier",
    "Middle-Tier",
    "High-Tier",
    "Elite-Tier",
    "Celestial-Tier",
];

/// (rank, tp, mp, tier, stars).
const REQUIREMENTS: [(&str, u64, u64, Option<&str>, u8); 6] = [
    ("Acolyte", 1, 0, None, 0),
    ("Disciple", 5, 3, Some("Low-Tier"), 0),
    ("Seeker", 12, 5, Some("Low-Tier"), 0),
    ("Knight", 18, 9, Some("Middle-Tier"), 0),
    ("Gray Knight", 24, 12, Some("Middle-Tier"), 2),
    ("Silver Knight", 30, 18, Some("Middle-Tier"), 3),
];

/// Rank ladder from Initiate to Elder Gray Emperor and tier ladder from Low to Legend.
pub fn gray_order() -> TablesConfig {
    let ranks = RANKS
        .iter()
        .map(|&name| {
            let mut spec = RankSpec::new(name);
            if let Some(&(_, tp, mp, tier, stars)) =
                REQUIREMENTS.iter().find(|(rank, ..)| *rank == name)
            {
                let mut minimums = BTreeMap::from([(Category::Training, tp)]);
                if mp > 0 {
                    minimums.insert(Category::Mission, mp);
                }
                spec = spec.with_requirement(RequirementSpec {
                    minimums,
                    tier: tier.map(str::to_owned),
                    stars,
                });
            }
            match name {
                "Gray Lord" | "Ashen Lord" => spec.with_notice(COUNCIL_NOTICE),
                "Gray Emperor" => spec.with_notice(EMPEROR_NOTICE),
                _ => spec,
            }
        })
        .collect();

    let bases = TIERS
        .iter()
        .map(|&(name, role)| BaseTier {
            name: name.to_owned(),
            marker: Marker::from(role),
        })
        .collect();
    let stars = STARS
        .iter()
        .map(|&(name, role, count)| StarModifier {
            name: name.to_owned(),
            marker: Marker::from(role),
            count,
            eligible: STAR_ELIGIBLE.iter().map(|s| (*s).to_owned()).collect(),
        })
        .collect();

    TablesConfig {
        ranks: RankTableConfig {
            ranks,
            hr_gate: Some(HR_GATE.to_owned()),
            notice: DEFAULT_NOTICE.to_owned(),
            retired: Some(RetiredSpec {
                marker: Marker::from(RETIRED_ROLE),
                name: "Retired".to_owned(),
                notice: RETIRED_NOTICE.to_owned(),
            }),
        },
        tiers: TierTableConfig { bases, stars },
    }
}

/// Role marker of a preset base tier or star modifier, by name.
pub fn tier_marker(name: &str) -> Option<Marker> {
    TIERS
        .iter()
        .map(|&(n, role)| (n, role))
        .chain(STARS.iter().map(|&(n, role, _)| (n, role)))
        .find(|(n, _)| *n == name)
        .map(|(_, role)| Marker::from(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RankEngine;

    #[test]
    fn test_gray_order_is_valid() {
        let engine = RankEngine::new(gray_order()).unwrap();
        assert_eq!(engine.ranks().len(), RANKS.len());
        assert_eq!(engine.tiers().len(), TIERS.len());
        assert_eq!(engine.ranks().hr_gate(), engine.ranks().id(HR_GATE));
        assert_eq!(
            engine.ranks().retired().map(|r| r.marker.clone()),
            Some(Marker::from(RETIRED_ROLE))
        );
    }

    #[test]
    fn test_tier_marker_lookup() {
        assert_eq!(
            tier_marker("Low-Tier"),
            Some(Marker::from("1383019912762626108"))
        );
        assert_eq!(
            tier_marker("[ ⁂ ]"),
            Some(Marker::from("1384516311354445965"))
        );
        assert_eq!(tier_marker("Nope"), None);
    }
}
