//! Points ledger: atomic per-(scope, entity, category) counters behind a pluggable store.
//!
//! Each account is an `Arc`-shared cell of atomics. The store registry is only locked to
//! find or create a cell; every increment after that is a lock-free CAS loop, so concurrent
//! updates to the same key never lose a write and updates to different keys never contend.

pub mod account;
pub mod ledger;
pub mod store;

pub use account::{Account, AccountCell, AccountKey, Removal};
pub use ledger::{BatchOutcome, ItemOutcome, PointsLedger};
pub use store::{FileLedgerStore, LedgerError, LedgerStore, MemoryLedgerStore};
