//! Per-entity results of mutation commands.

use tally_ledger::LedgerError;
use tally_primitives::{Category, EntityId};

/// One applied change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub category: Category,
    pub delta: i64,
    /// Balance after the change.
    pub total: u64,
}

#[derive(Debug)]
pub enum EntityOutcome {
    Awarded(Vec<Award>),
    /// Clamped removal. `removed` is zero when there was nothing to take.
    Removed {
        category: Category,
        removed: u64,
        total: u64,
    },
    /// Not a member of the scope; nothing was changed.
    NotFound,
    /// A store write failed. `awards` lists what was applied before the failure.
    Failed {
        awards: Vec<Award>,
        error: LedgerError,
    },
}

impl EntityOutcome {
    pub fn awards(&self) -> &[Award] {
        match self {
            Self::Awarded(awards) | Self::Failed { awards, .. } => awards,
            _ => &[],
        }
    }

    /// Whether any balance changed.
    pub fn changed(&self) -> bool {
        match self {
            Self::Removed { removed, .. } => *removed > 0,
            other => !other.awards().is_empty(),
        }
    }
}

/// What a mutation command did, entity by entity in argument order.
#[derive(Debug, Default)]
pub struct CommandReport {
    pub entries: Vec<(EntityId, EntityOutcome)>,
    /// Point the caller earned for running the command, or why it could not be written.
    pub caller_bonus: Option<(EntityId, EntityOutcome)>,
    pub rollcall: Option<String>,
}

impl CommandReport {
    pub(crate) fn with_rollcall(rollcall: Option<&str>) -> Self {
        Self {
            rollcall: rollcall.map(|link| link.trim().to_owned()),
            ..Default::default()
        }
    }

    pub fn outcome(&self, entity: EntityId) -> Option<&EntityOutcome> {
        self.entries
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, outcome)| outcome)
    }

    pub fn not_found(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, EntityOutcome::NotFound))
            .map(|(id, _)| *id)
    }

    pub fn failed(&self) -> impl Iterator<Item = (EntityId, &LedgerError)> + '_ {
        self.entries.iter().filter_map(|(id, o)| match o {
            EntityOutcome::Failed { error, .. } => Some((*id, error)),
            _ => None,
        })
    }

    /// Entities whose balance changed.
    pub fn changed(&self) -> usize {
        self.entries.iter().filter(|(_, o)| o.changed()).count()
    }

    /// Entities that resolved in the directory, whatever happened to them after.
    pub fn resolved(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| !matches!(o, EntityOutcome::NotFound))
            .count()
    }
}
