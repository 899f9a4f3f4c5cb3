//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`TALLY_` prefix, `__` between nested keys)
//! 4. Defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tally_commands::Permissions;
use tally_leaderboard::DEFAULT_PAGE_SIZE;
use tally_ranks::TablesConfig;
use tally_throttle::ThrottleConfig;
use tally_view::DEFAULT_IDLE_TIMEOUT;

pub const ENV_PREFIX: &str = "TALLY_";

/// Where durable state lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON ledger file.
    pub ledger: PathBuf,
    /// JSON directory snapshot (scope → members).
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from("tally-data/ledger.json"),
            directory: PathBuf::from("tally-data/directory.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub idle_timeout_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

impl ViewConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub page_size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// TOML file with rank and tier tables. The built-in ladder when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<PathBuf>,
    pub storage: StorageConfig,
    pub throttle: ThrottleConfig,
    pub view: ViewConfig,
    pub leaderboard: LeaderboardConfig,
    pub permissions: Permissions,
}

impl TallyConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::figment(config_path)
            .extract()
            .wrap_err("Failed to load configuration")
    }

    /// Layered providers, without extracting.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(path) = config_path
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }
        figment
    }

    /// Rank and tier tables, from [`Self::tables`] or the built-in ladder.
    pub fn load_tables(&self) -> Result<TablesConfig> {
        match &self.tables {
            Some(path) => TablesConfig::load(path)
                .wrap_err_with(|| format!("failed to load tables from {}", path.display())),
            None => Ok(TablesConfig::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).wrap_err("failed to serialize configuration")
    }
}
