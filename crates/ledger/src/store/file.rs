//! JSON file-based ledger store with atomic writes.

use std::fs::{self, File};
use std::mem;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tally_primitives::{Category, ScopeId};
use tracing::{debug, warn};

use crate::account::{Account, AccountKey, Removal};

use super::memory::MemoryLedgerStore;
use super::{LedgerError, LedgerStore};

/// JSON file store. Loaded to memory on open, written back on flush.
///
/// Increments are served by an inner [`MemoryLedgerStore`], so they stay atomic; the file
/// is only the durable image of those counters.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    inner: MemoryLedgerStore,
    dirty: Mutex<bool>,
}

impl FileLedgerStore {
    /// Load existing file or create empty store.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let accounts = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            Vec::new()
        };
        debug!(path = %path.display(), count = accounts.len(), "opened ledger file");

        Ok(Self {
            path,
            inner: MemoryLedgerStore::with_accounts(accounts),
            dirty: Mutex::new(false),
        })
    }

    /// Create store, making parent directories if needed.
    pub fn new_with_create_dir(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::new(path)
    }

    fn load_from_file(path: &Path) -> Result<Vec<Account>, LedgerError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    fn save_to_file(&self) -> Result<(), LedgerError> {
        let mut accounts = self.inner.snapshots();
        accounts.sort_by_key(Account::key);

        // Write to temp file first, then rename (atomic)
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &accounts)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        }

        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), count = accounts.len(), "flushed ledger file");
        Ok(())
    }

    fn mark_dirty(&self) {
        *self.dirty.lock() = true;
    }

    pub fn is_dirty(&self) -> bool {
        *self.dirty.lock()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileLedgerStore {
    fn increment(
        &self,
        key: AccountKey,
        category: Category,
        delta: i64,
    ) -> Result<u64, LedgerError> {
        let total = self.inner.increment(key, category, delta)?;
        self.mark_dirty();
        Ok(total)
    }

    fn take(
        &self,
        key: AccountKey,
        category: Category,
        amount: u64,
    ) -> Result<Removal, LedgerError> {
        let removal = self.inner.take(key, category, amount)?;
        if removal.removed > 0 {
            self.mark_dirty();
        }
        Ok(removal)
    }

    fn load(&self, key: AccountKey) -> Result<Option<Account>, LedgerError> {
        self.inner.load(key)
    }

    fn accounts(&self, scope: ScopeId) -> Result<Vec<Account>, LedgerError> {
        self.inner.accounts(scope)
    }

    fn count(&self) -> Result<usize, LedgerError> {
        self.inner.count()
    }

    /// The dirty flag is cleared before the snapshot is taken, so a write racing the
    /// flush leaves the store dirty for the next one.
    fn flush(&self) -> Result<(), LedgerError> {
        if !mem::replace(&mut *self.dirty.lock(), false) {
            return Ok(());
        }
        if let Err(err) = self.save_to_file() {
            self.mark_dirty();
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for FileLedgerStore {
    fn drop(&mut self) {
        if self.is_dirty()
            && let Err(err) = self.save_to_file()
        {
            warn!(path = %self.path.display(), %err, "ledger flush on drop failed");
        }
    }
}
