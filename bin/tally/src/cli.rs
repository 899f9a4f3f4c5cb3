//! Tally CLI entry point.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr};
use tally_commands::CommandService;
use tally_ledger::{FileLedgerStore, PointsLedger};
use tally_node_core::{LogArgs, TallyConfig, logging};
use tally_primitives::{Category, DirectorySnapshot, EntityId, ScopeId, StaticDirectory};
use tally_ranks::RankEngine;
use tally_throttle::GuildThrottle;
use tally_view::{NullSink, ViewRegistry};
use tracing::{debug, info, warn};

use crate::output;

type Service = CommandService<FileLedgerStore, StaticDirectory, NullSink>;

/// Tally - per-scope contribution ledger, standings and leaderboards
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Configuration file (TOML).
    #[arg(long, short, global = true, env = "TALLY_CONFIG", value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,

    /// Ledger file, overriding the configuration.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) ledger: Option<PathBuf>,

    /// Directory snapshot file, overriding the configuration.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) directory: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Change point balances directly.
    #[command(subcommand)]
    Points(PointsCommand),

    /// Show a member's points, rank, tier and next requirement.
    Profile(ProfileArgs),

    /// Print one page of a scope's leaderboard.
    Leaderboard(LeaderboardArgs),

    /// Print the effective configuration.
    Config,
}

#[derive(Debug, Subcommand)]
pub(crate) enum PointsCommand {
    /// Add points (negative amounts subtract, flooring at zero).
    Add(AddArgs),
    /// Remove up to the given amount.
    Remove(RemoveArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AddArgs {
    #[arg(long)]
    pub(crate) scope: ScopeId,
    #[arg(long)]
    pub(crate) entity: EntityId,
    /// tp, mp, rp, wp or eve.
    #[arg(long)]
    pub(crate) category: Category,
    #[arg(allow_negative_numbers = true)]
    pub(crate) amount: i64,
}

#[derive(Debug, Args)]
pub(crate) struct RemoveArgs {
    #[arg(long)]
    pub(crate) scope: ScopeId,
    #[arg(long)]
    pub(crate) entity: EntityId,
    /// tp, mp, rp, wp or eve.
    #[arg(long)]
    pub(crate) category: Category,
    pub(crate) amount: u64,
}

#[derive(Debug, Args)]
pub(crate) struct ProfileArgs {
    #[arg(long)]
    pub(crate) scope: ScopeId,
    #[arg(long)]
    pub(crate) entity: EntityId,
}

#[derive(Debug, Args)]
pub(crate) struct LeaderboardArgs {
    #[arg(long)]
    pub(crate) scope: ScopeId,
    /// Member whose position is reported.
    #[arg(long, default_value_t = EntityId(0))]
    pub(crate) invoker: EntityId,
    /// Only this base tier.
    #[arg(long, value_name = "NAME")]
    pub(crate) tier: Option<String>,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
}

impl Cli {
    /// Load configuration and apply CLI overrides.
    pub(crate) fn config(&self) -> Result<TallyConfig> {
        let mut config = TallyConfig::load(self.config.as_deref())?;
        if let Some(ledger) = &self.ledger {
            config.storage.ledger = ledger.clone();
        }
        if let Some(directory) = &self.directory {
            config.storage.directory = directory.clone();
        }
        Ok(config)
    }
}

/// Parse arguments, set up logging and run the selected command.
pub(crate) async fn run() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    let config = cli.config()?;
    debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
        Commands::Points(command) => {
            let service = open_service(&config)?;
            points(&service, command)?;
        }
        Commands::Profile(args) => {
            let service = open_service(&config)?;
            let profile = service.profile(args.scope, args.entity).await?;
            println!("{}", output::profile(&profile, service.engine()));
        }
        Commands::Leaderboard(args) => {
            let service = open_service(&config)?;
            let pages = service
                .leaderboard_pages(args.scope, args.invoker, args.tier.as_deref())
                .await?;
            println!("{}", output::leaderboard(pages.as_ref(), args.page));
        }
    }

    Ok(())
}

fn points(service: &Service, command: PointsCommand) -> Result<()> {
    let ledger = service.ledger();
    match command {
        PointsCommand::Add(args) => {
            let total = ledger.add(args.scope, args.entity, args.category, args.amount)?;
            info!(scope = %args.scope, entity = %args.entity, category = %args.category, delta = args.amount, total, "points added");
            println!("{} {}: {total}", args.entity, args.category.label());
        }
        PointsCommand::Remove(args) => {
            let removal = ledger.remove(args.scope, args.entity, args.category, args.amount)?;
            info!(scope = %args.scope, entity = %args.entity, category = %args.category, removed = removal.removed, total = removal.total, "points removed");
            println!(
                "{} {}: -{} -> {}",
                args.entity,
                args.category.label(),
                removal.removed,
                removal.total
            );
        }
    }
    ledger.flush().wrap_err("failed to write ledger")?;
    Ok(())
}

fn open_service(config: &TallyConfig) -> Result<Service> {
    let store = FileLedgerStore::new_with_create_dir(&config.storage.ledger).wrap_err_with(|| {
        format!("failed to open ledger: {}", config.storage.ledger.display())
    })?;
    let directory = load_directory(&config.storage.directory)?;
    let engine = RankEngine::new(config.load_tables()?).wrap_err("invalid rank tables")?;

    let service = CommandService::new(
        Arc::new(PointsLedger::new(store)),
        Arc::new(directory),
        Arc::new(engine),
        Arc::new(GuildThrottle::new(config.throttle.clone())),
        Arc::new(ViewRegistry::with_idle_timeout(
            Arc::new(NullSink),
            config.view.idle_timeout(),
        )),
    )
    .with_permissions(config.permissions.clone())
    .with_page_size(config.leaderboard.page_size);
    Ok(service)
}

/// Read a directory snapshot. A missing file is an empty directory.
pub(crate) fn load_directory(path: &Path) -> Result<StaticDirectory> {
    if !path.exists() {
        warn!(path = %path.display(), "directory snapshot not found, starting empty");
        return Ok(StaticDirectory::new());
    }
    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read directory snapshot: {}", path.display()))?;
    let snapshot: DirectorySnapshot = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("failed to parse directory snapshot: {}", path.display()))?;
    Ok(StaticDirectory::from_snapshot(snapshot))
}
