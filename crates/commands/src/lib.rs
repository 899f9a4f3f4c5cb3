//! Command semantics of the contribution tracker: awards, deductions, profiles and
//! leaderboards, with permission checks and per-entity reporting.
//!
//! Rendering is not handled here. Commands return structured outcomes and the
//! transport layer turns them into messages.

mod error;
mod mention;
mod permissions;
mod profile;
mod report;
mod service;

pub use error::CommandError;
pub use mention::{is_valid_rollcall, parse_mentions};
pub use permissions::{Access, Permissions};
pub use profile::{Profile, ProfileCard, STORY_CATEGORIES};
pub use report::{Award, CommandReport, EntityOutcome};
pub use service::{
    ATTENDED_POINTS, CommandService, HOST_BONUS, LeaderboardOutcome, MAX_MISSION_POINTS,
    MVP_POINTS, PROMO_POINTS, Training,
};
