//! Leaderboard ordering and pagination.
//!
//! A [`Leaderboard`] is computed per request from the directory's members and is never
//! persisted.

mod board;
mod builder;

pub use board::{Entry, Leaderboard};
pub use builder::{DEFAULT_PAGE_SIZE, LeaderboardBuilder};
