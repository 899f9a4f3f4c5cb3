use std::collections::BTreeMap;

use tally_primitives::{Category, EntityId};
use tally_ranks::{NextRank, RankId, Standing};

/// Categories that must all be zero for a member to have no story yet. Event points
/// do not count.
pub const STORY_CATEGORIES: [Category; 4] =
    [Category::Training, Category::Mission, Category::Raid, Category::War];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    /// No record, or nothing earned in any story category.
    NoStory { entity: EntityId, name: String },
    Card(ProfileCard),
}

impl Profile {
    pub fn card(&self) -> Option<&ProfileCard> {
        match self {
            Self::Card(card) => Some(card),
            Self::NoStory { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard {
    pub entity: EntityId,
    pub name: String,
    pub points: BTreeMap<Category, u64>,
    pub rank: Option<RankId>,
    pub rank_name: Option<String>,
    pub standing: Option<Standing>,
    pub tier_label: Option<String>,
    /// `None` for retired members, whatever their last rank was.
    pub next: Option<NextRank>,
    /// Farewell text for retired members.
    pub retired: Option<String>,
}

impl ProfileCard {
    pub fn points(&self, category: Category) -> u64 {
        self.points.get(&category).copied().unwrap_or(0)
    }
}
