use tally_ledger::LedgerError;
use tally_primitives::{Category, EntityId};
use tally_ranks::RankError;
use tally_view::ViewError;
use thiserror::Error;

/// Why a command was refused or failed as a whole.
///
/// Per-entity problems inside a batch are not errors; they are reported in the
/// [`CommandReport`](crate::CommandReport).
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("you lack permission")]
    PermissionDenied,
    #[error("invalid roll-call link format")]
    InvalidRollCall,
    #[error("no valid member mentions found")]
    NoValidMentions,
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),
    #[error("{0} points cannot be used with this command")]
    InvalidCategory(Category),
    #[error("member {0} not found")]
    UnknownMember(EntityId),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
