//! The points ledger: validated, per-item atomic operations over a [`LedgerStore`].

use tally_primitives::{Category, Directory, EntityId, ScopeId};
use tracing::{debug, trace, warn};

use crate::account::{Account, AccountKey, Removal};
use crate::store::{LedgerError, LedgerStore};

/// Result for one entity of a batch.
#[derive(Debug)]
pub enum ItemOutcome {
    Applied { total: u64 },
    /// The directory does not know this entity in the scope.
    NotFound,
    Failed(LedgerError),
}

impl ItemOutcome {
    pub fn total(&self) -> Option<u64> {
        match self {
            Self::Applied { total } => Some(*total),
            _ => None,
        }
    }
}

/// Per-entity results of a batch, in input order. Never a whole-batch failure.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<(EntityId, ItemOutcome)>,
}

impl BatchOutcome {
    pub fn push(&mut self, entity: EntityId, outcome: ItemOutcome) {
        self.items.push((entity, outcome));
    }

    pub fn extend(&mut self, other: BatchOutcome) {
        self.items.extend(other.items);
    }

    pub fn applied(&self) -> impl Iterator<Item = (EntityId, u64)> + '_ {
        self.items
            .iter()
            .filter_map(|(id, outcome)| outcome.total().map(|t| (*id, t)))
    }

    pub fn not_found(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ItemOutcome::NotFound))
            .map(|(id, _)| *id)
    }

    pub fn failed(&self) -> impl Iterator<Item = (EntityId, &LedgerError)> + '_ {
        self.items.iter().filter_map(|(id, outcome)| match outcome {
            ItemOutcome::Failed(err) => Some((*id, err)),
            _ => None,
        })
    }

    /// Total of the last applied update for `entity`, if any.
    pub fn total_for(&self, entity: EntityId) -> Option<u64> {
        self.items
            .iter()
            .rev()
            .find(|(id, _)| *id == entity)
            .and_then(|(_, outcome)| outcome.total())
    }

    pub fn any_applied(&self) -> bool {
        self.applied().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Points ledger over a durable store.
///
/// Single-key operations rely entirely on the store's atomic read-modify-write; the
/// ledger adds no locking of its own.
#[derive(Debug)]
pub struct PointsLedger<S> {
    store: S,
}

impl<S: LedgerStore> PointsLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Atomically add `delta` (may be negative) and return the new total.
    pub fn add(
        &self,
        scope: ScopeId,
        entity: EntityId,
        category: Category,
        delta: i64,
    ) -> Result<u64, LedgerError> {
        let total = self
            .store
            .increment(AccountKey::new(scope, entity), category, delta)?;
        trace!(%scope, %entity, %category, delta, total, "points added");
        Ok(total)
    }

    /// Apply the same delta to each entity the directory resolves in `scope`.
    ///
    /// Unknown entities are reported as [`ItemOutcome::NotFound`]; store failures are
    /// reported per entity and the remaining entities are still attempted. Repeated ids
    /// are applied once per occurrence.
    pub async fn batch_add<D>(
        &self,
        directory: &D,
        scope: ScopeId,
        entities: &[EntityId],
        category: Category,
        delta: i64,
    ) -> BatchOutcome
    where
        D: Directory + ?Sized,
    {
        let mut outcome = BatchOutcome::default();
        for &entity in entities {
            if directory.lookup(scope, entity).await.is_none() {
                debug!(%scope, %entity, "batch entity not in directory");
                outcome.push(entity, ItemOutcome::NotFound);
                continue;
            }
            let item = match self.add(scope, entity, category, delta) {
                Ok(total) => ItemOutcome::Applied { total },
                Err(err) => {
                    warn!(%scope, %entity, %category, %err, "batch item failed");
                    ItemOutcome::Failed(err)
                }
            };
            outcome.push(entity, item);
        }
        outcome
    }

    /// Remove up to `amount`; the balance never drops below zero.
    pub fn remove(
        &self,
        scope: ScopeId,
        entity: EntityId,
        category: Category,
        amount: u64,
    ) -> Result<Removal, LedgerError> {
        let removal = self
            .store
            .take(AccountKey::new(scope, entity), category, amount)?;
        debug_assert!(
            removal.removed <= amount,
            "store removed {} {category} but only {amount} was requested",
            removal.removed
        );
        trace!(%scope, %entity, %category, amount, removed = removal.removed, total = removal.total, "points removed");
        Ok(removal)
    }

    /// Pure read. `None` means no record exists; nothing is created.
    pub fn get(&self, scope: ScopeId, entity: EntityId) -> Result<Option<Account>, LedgerError> {
        self.store.load(AccountKey::new(scope, entity))
    }

    pub fn accounts(&self, scope: ScopeId) -> Result<Vec<Account>, LedgerError> {
        self.store.accounts(scope)
    }

    pub fn flush(&self) -> Result<(), LedgerError> {
        self.store.flush()
    }
}
