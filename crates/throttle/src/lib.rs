//! Per-scope throttle for mutation commands.
//!
//! Each scope gets one async mutex, created lazily. A mutation holds it for its whole
//! run, after a short fixed delay, so commands in one scope are applied one at a time
//! and spaced out while different scopes proceed in parallel. Idle scopes can be evicted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tally_primitives::ScopeId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, trace};

/// Throttle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Wait after acquiring a scope, before the command runs.
    pub min_delay_ms: u64,
    /// Entities per chunk in batch operations.
    pub chunk_size: usize,
    /// Pause between chunks.
    pub chunk_pause_ms: u64,
    /// Scopes unused for this long are dropped by [`GuildThrottle::evict_idle`].
    pub idle_eviction_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 250,
            chunk_size: 5,
            chunk_pause_ms: 100,
            idle_eviction_secs: 600,
        }
    }
}

impl ThrottleConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn chunk_pause(&self) -> Duration {
        Duration::from_millis(self.chunk_pause_ms)
    }

    pub fn idle_eviction(&self) -> Duration {
        Duration::from_secs(self.idle_eviction_secs)
    }
}

#[derive(Debug)]
struct ScopeSlot {
    lock: Arc<Mutex<()>>,
    last_used: parking_lot::Mutex<Instant>,
}

impl ScopeSlot {
    fn new() -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            last_used: parking_lot::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }
}

/// Exclusive hold on one scope. Released on drop.
#[derive(Debug)]
pub struct ScopeGuard {
    scope: ScopeId,
    slot: Arc<ScopeSlot>,
    chunk_size: usize,
    chunk_pause: Duration,
    _guard: OwnedMutexGuard<()>,
}

impl ScopeGuard {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// Hand `items` to `f` one chunk at a time, in order, pausing between chunks.
    pub async fn apply_chunked<'a, T, R, F, Fut>(&self, items: &'a [T], mut f: F) -> Vec<R>
    where
        F: FnMut(&'a [T]) -> Fut,
        Fut: Future<Output = R>,
    {
        let mut results = Vec::with_capacity(items.len().div_ceil(self.chunk_size));
        for (i, chunk) in items.chunks(self.chunk_size).enumerate() {
            if i > 0 {
                trace!(scope = %self.scope, chunk = i, "pausing between chunks");
                if self.chunk_pause.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(self.chunk_pause).await;
                }
            }
            results.push(f(chunk).await);
        }
        results
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.slot.touch();
    }
}

/// Lazily created per-scope locks with a minimum spacing between holders.
#[derive(Debug, Default)]
pub struct GuildThrottle {
    slots: DashMap<ScopeId, Arc<ScopeSlot>>,
    config: ThrottleConfig,
}

impl GuildThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            slots: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    fn slot(&self, scope: ScopeId) -> Arc<ScopeSlot> {
        if let Some(slot) = self.slots.get(&scope) {
            return Arc::clone(slot.value());
        }
        Arc::clone(
            self.slots
                .entry(scope)
                .or_insert_with(|| {
                    debug!(%scope, "creating scope lock");
                    Arc::new(ScopeSlot::new())
                })
                .value(),
        )
    }

    /// Wait for the scope, then for the minimum delay.
    pub async fn acquire(&self, scope: ScopeId) -> ScopeGuard {
        let slot = self.slot(scope);
        let guard = Arc::clone(&slot.lock).lock_owned().await;
        let delay = self.config.min_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        trace!(%scope, "scope acquired");
        ScopeGuard {
            scope,
            slot,
            chunk_size: self.config.chunk_size.max(1),
            chunk_pause: self.config.chunk_pause(),
            _guard: guard,
        }
    }

    /// Run `f` while holding the scope.
    pub async fn run<F, Fut, T>(&self, scope: ScopeId, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(scope).await;
        f().await
    }

    /// Drop locks for scopes that nobody holds or waits on and that have been idle for
    /// longer than the configured period. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let max_idle = self.config.idle_eviction();
        let now = Instant::now();
        let before = self.slots.len();
        self.slots.retain(|_, slot| {
            Arc::strong_count(slot) > 1 || now.duration_since(*slot.last_used.lock()) < max_idle
        });
        let evicted = before.saturating_sub(self.slots.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.slots.len(), "evicted idle scope locks");
        }
        evicted
    }

    /// Number of scopes with a lock.
    pub fn scopes(&self) -> usize {
        self.slots.len()
    }
}
