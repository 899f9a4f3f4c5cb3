//! Durable store contract and implementations (memory, file).

mod file;
mod memory;

use auto_impl::auto_impl;
use tally_primitives::{Category, ScopeId};
use thiserror::Error;

use crate::account::{Account, AccountKey, Removal};

pub use file::FileLedgerStore;
pub use memory::MemoryLedgerStore;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Transient backend failure; the caller may retry.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("{category} total would overflow")]
    Overflow { category: Category },
}

/// Storage backend for accounts, with auto-impl for &, Box, Arc.
///
/// `increment` and `take` must each be a single linearizable read-modify-write on the
/// stored value. `load` must never create a record.
#[auto_impl(&, Box, Arc)]
pub trait LedgerStore: Send + Sync {
    /// Add `delta` and return the new total, creating the account if absent.
    fn increment(
        &self,
        key: AccountKey,
        category: Category,
        delta: i64,
    ) -> Result<u64, LedgerError>;

    /// Remove `min(amount, balance)`. Absent accounts report nothing removed.
    fn take(
        &self,
        key: AccountKey,
        category: Category,
        amount: u64,
    ) -> Result<Removal, LedgerError>;

    fn load(&self, key: AccountKey) -> Result<Option<Account>, LedgerError>;

    fn contains(&self, key: AccountKey) -> Result<bool, LedgerError> {
        Ok(self.load(key)?.is_some())
    }

    /// Every account recorded in `scope`.
    fn accounts(&self, scope: ScopeId) -> Result<Vec<Account>, LedgerError>;

    fn count(&self) -> Result<usize, LedgerError>;

    fn flush(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
