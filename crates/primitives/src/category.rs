//! Closed set of point categories.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString};

/// Point type accumulated per entity.
///
/// Adding a category is an explicit extension of this enum; free-form keys are not accepted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[serde(rename = "tp", alias = "training")]
    #[strum(to_string = "tp", serialize = "training")]
    Training,
    #[serde(rename = "mp", alias = "mission")]
    #[strum(to_string = "mp", serialize = "mission")]
    Mission,
    #[serde(rename = "rp", alias = "raid")]
    #[strum(to_string = "rp", serialize = "raid")]
    Raid,
    #[serde(rename = "wp", alias = "war")]
    #[strum(to_string = "wp", serialize = "war")]
    War,
    #[serde(rename = "eve", alias = "event")]
    #[strum(to_string = "eve", serialize = "event")]
    Event,
}

impl Category {
    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Training => "Training Points",
            Self::Mission => "Mission Points",
            Self::Raid => "Raid Points",
            Self::War => "War Points",
            Self::Event => "Event Points",
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_short_keys_roundtrip() {
        for category in Category::iter() {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("tp".parse::<Category>().unwrap(), Category::Training);
        assert_eq!("Mission".parse::<Category>().unwrap(), Category::Mission);
        assert_eq!("EVE".parse::<Category>().unwrap(), Category::Event);
        assert!("xp".parse::<Category>().is_err());
        assert_eq!(Category::War.to_string(), "wp");
    }

    #[test]
    fn test_category_serde_keys() {
        let json = serde_json::to_string(&Category::Raid).unwrap();
        assert_eq!(json, "\"rp\"");
        let parsed: Category = serde_json::from_str("\"event\"").unwrap();
        assert_eq!(parsed, Category::Event);
    }
}
