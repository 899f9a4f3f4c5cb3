//! Lock-free account cells and their serializable snapshots.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tally_primitives::{Category, EntityId, ScopeId};

use crate::store::LedgerError;

const ORD: Ordering = Ordering::Relaxed;

/// Unique account key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    pub scope: ScopeId,
    pub entity: EntityId,
}

impl AccountKey {
    pub const fn new(scope: ScopeId, entity: EntityId) -> Self {
        Self { scope, entity }
    }
}

/// Outcome of a clamped removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// Amount actually taken, `min(requested, balance)`.
    pub removed: u64,
    /// Balance after the removal.
    pub total: u64,
}

/// Persisted shape of one account. Categories missing from `points` are zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub scope: ScopeId,
    pub entity: EntityId,
    #[serde(default)]
    pub points: BTreeMap<Category, u64>,
    #[serde(default)]
    pub updated_at: u64,
}

impl Account {
    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.scope, self.entity)
    }

    pub fn points(&self, category: Category) -> u64 {
        self.points.get(&category).copied().unwrap_or(0)
    }

    /// True when every listed category is zero.
    pub fn is_blank(&self, categories: &[Category]) -> bool {
        categories.iter().all(|c| self.points(*c) == 0)
    }
}

/// Atomic counters for one account.
#[derive(Debug, Default)]
pub struct AccountCell {
    training: AtomicU64,
    mission: AtomicU64,
    raid: AtomicU64,
    war: AtomicU64,
    event: AtomicU64,
    updated_at: AtomicU64,
}

impl AccountCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cell from a persisted account.
    pub fn from_account(account: &Account) -> Self {
        let cell = Self::new();
        for (category, value) in &account.points {
            cell.counter(*category).store(*value, ORD);
        }
        cell.updated_at.store(account.updated_at, ORD);
        cell
    }

    fn counter(&self, category: Category) -> &AtomicU64 {
        match category {
            Category::Training => &self.training,
            Category::Mission => &self.mission,
            Category::Raid => &self.raid,
            Category::War => &self.war,
            Category::Event => &self.event,
        }
    }

    pub fn get(&self, category: Category) -> u64 {
        self.counter(category).load(ORD)
    }

    /// Atomically apply a signed delta with a CAS loop. Negative results floor at zero.
    pub fn add(&self, category: Category, delta: i64) -> Result<u64, LedgerError> {
        let counter = self.counter(category);
        loop {
            let current = counter.load(ORD);
            let next = match current.checked_add_signed(delta) {
                Some(next) => next,
                None if delta < 0 => 0,
                None => return Err(LedgerError::Overflow { category }),
            };
            if counter
                .compare_exchange_weak(current, next, ORD, ORD)
                .is_ok()
            {
                self.touch();
                return Ok(next);
            }
        }
    }

    /// Atomically take `min(amount, balance)`.
    pub fn take(&self, category: Category, amount: u64) -> Removal {
        let counter = self.counter(category);
        loop {
            let current = counter.load(ORD);
            let removed = amount.min(current);
            let total = current - removed;
            if counter
                .compare_exchange_weak(current, total, ORD, ORD)
                .is_ok()
            {
                if removed > 0 {
                    self.touch();
                }
                return Removal { removed, total };
            }
        }
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at.load(ORD)
    }

    fn touch(&self) {
        self.updated_at.store(current_unix_timestamp(), ORD);
    }

    pub fn snapshot(&self, key: AccountKey) -> Account {
        let points = [
            Category::Training,
            Category::Mission,
            Category::Raid,
            Category::War,
            Category::Event,
        ]
        .into_iter()
        .filter_map(|c| {
            let value = self.get(c);
            (value > 0).then_some((c, value))
        })
        .collect();

        Account {
            scope: key.scope,
            entity: key.entity,
            points,
            updated_at: self.updated_at(),
        }
    }
}

fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
