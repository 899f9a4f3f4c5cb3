//! Rank and tier derivation.
//!
//! Both ladders are immutable tables built once at startup and passed around explicitly.
//! Resolution only reads a member's role markers through [`tally_primitives::Member`].

mod engine;
mod error;
pub mod presets;
mod rank;
mod tier;

pub use engine::{NextRank, RankEngine, Requirement, TablesConfig};
pub use error::RankError;
pub use rank::{
    DEFAULT_NOTICE, RankId, RankSpec, RankTable, RankTableConfig, RequirementSpec, RetiredSpec,
};
pub use tier::{
    BaseTier, Standing, StarModifier, TierAssignment, TierLevel, TierTable, TierTableConfig,
};
