//! Shared plumbing for tally binaries: layered configuration and logging setup.

pub mod args;
pub mod config;
pub mod logging;

pub use args::LogArgs;
pub use config::{LeaderboardConfig, StorageConfig, TallyConfig, ViewConfig};
