//! In-memory ledger store (does not persist across restarts).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tally_primitives::{Category, ScopeId};
use tracing::debug;

use crate::account::{Account, AccountCell, AccountKey, Removal};

use super::{LedgerError, LedgerStore};

/// Account registry using double-checked locking.
///
/// The map lock is held only long enough to clone the account's `Arc`; counter updates
/// happen on the cell without any lock.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    accounts: RwLock<HashMap<AccountKey, Arc<AccountCell>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with persisted accounts, replacing existing cells.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        {
            let mut map = store.accounts.write();
            for account in accounts {
                map.insert(account.key(), Arc::new(AccountCell::from_account(&account)));
            }
        }
        store
    }

    /// Get the cell if the account exists. Never creates.
    pub fn cell(&self, key: &AccountKey) -> Option<Arc<AccountCell>> {
        self.accounts.read().get(key).map(Arc::clone)
    }

    /// Get or create the cell for `key`.
    pub fn cell_or_create(&self, key: AccountKey) -> Arc<AccountCell> {
        // Fast path: read lock
        {
            let accounts = self.accounts.read();
            if let Some(cell) = accounts.get(&key) {
                return Arc::clone(cell);
            }
        }

        // Slow path: write lock (only on first write per account)
        let mut accounts = self.accounts.write();
        accounts
            .entry(key)
            .or_insert_with(|| {
                debug!(scope = %key.scope, entity = %key.entity, "creating account");
                Arc::new(AccountCell::new())
            })
            .clone()
    }

    pub fn snapshots(&self) -> Vec<Account> {
        self.accounts
            .read()
            .iter()
            .map(|(key, cell)| cell.snapshot(*key))
            .collect()
    }

    /// Drop every account in `scope`. Returns how many were removed.
    pub fn clear_scope(&self, scope: ScopeId) -> usize {
        let mut accounts = self.accounts.write();
        let before = accounts.len();
        accounts.retain(|key, _| key.scope != scope);
        before - accounts.len()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn increment(
        &self,
        key: AccountKey,
        category: Category,
        delta: i64,
    ) -> Result<u64, LedgerError> {
        self.cell_or_create(key).add(category, delta)
    }

    fn take(
        &self,
        key: AccountKey,
        category: Category,
        amount: u64,
    ) -> Result<Removal, LedgerError> {
        Ok(match self.cell(&key) {
            Some(cell) => cell.take(category, amount),
            None => Removal {
                removed: 0,
                total: 0,
            },
        })
    }

    fn load(&self, key: AccountKey) -> Result<Option<Account>, LedgerError> {
        Ok(self.cell(&key).map(|cell| cell.snapshot(key)))
    }

    fn accounts(&self, scope: ScopeId) -> Result<Vec<Account>, LedgerError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .read()
            .iter()
            .filter(|(key, _)| key.scope == scope)
            .map(|(key, cell)| cell.snapshot(*key))
            .collect();
        accounts.sort_by_key(|a| a.entity);
        Ok(accounts)
    }

    fn count(&self) -> Result<usize, LedgerError> {
        Ok(self.accounts.read().len())
    }
}

#[cfg(test)]
mod tests {
    use tally_primitives::EntityId;

    use super::*;

    fn key(scope: u64, entity: u64) -> AccountKey {
        AccountKey::new(ScopeId(scope), EntityId(entity))
    }

    #[test]
    fn test_basic() {
        let store = MemoryLedgerStore::new();
        assert_eq!(store.count().unwrap(), 0);

        assert_eq!(store.increment(key(1, 1), Category::Training, 2).unwrap(), 2);
        assert_eq!(store.increment(key(1, 1), Category::Training, 3).unwrap(), 5);
        assert_eq!(store.count().unwrap(), 1);

        let account = store.load(key(1, 1)).unwrap().unwrap();
        assert_eq!(account.points(Category::Training), 5);
        assert_eq!(account.points(Category::Mission), 0);
    }

    #[test]
    fn test_load_does_not_create() {
        let store = MemoryLedgerStore::new();
        assert!(store.load(key(1, 1)).unwrap().is_none());
        assert!(!store.contains(key(1, 1)).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_take_on_absent_account() {
        let store = MemoryLedgerStore::new();
        let removal = store.take(key(1, 1), Category::Mission, 5).unwrap();
        assert_eq!(removal.removed, 0);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let store = MemoryLedgerStore::new();
        store.increment(key(1, 7), Category::War, 1).unwrap();
        store.increment(key(2, 7), Category::War, 4).unwrap();
        store.increment(key(1, 3), Category::War, 1).unwrap();

        let scope1 = store.accounts(ScopeId(1)).unwrap();
        assert_eq!(scope1.len(), 2);
        assert_eq!(scope1[0].entity, EntityId(3));
        assert_eq!(store.load(key(2, 7)).unwrap().unwrap().points(Category::War), 4);

        assert_eq!(store.clear_scope(ScopeId(1)), 2);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_with_accounts() {
        let source = MemoryLedgerStore::new();
        source.increment(key(1, 1), Category::Raid, 9).unwrap();

        let store = MemoryLedgerStore::with_accounts(source.snapshots());
        assert_eq!(store.load(key(1, 1)).unwrap().unwrap().points(Category::Raid), 9);
    }
}
