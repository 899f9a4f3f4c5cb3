use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tracing::trace;

use crate::error::ViewError;
use crate::sink::ViewSink;
use crate::state::{Transition, ViewAction, ViewId, ViewPages};
use crate::view::{DEFAULT_IDLE_TIMEOUT, InteractiveView};

/// Live views by handle.
///
/// Unknown and expired handles are silent no-ops: a late button press on a torn-down
/// leaderboard does nothing.
#[derive(Debug)]
pub struct ViewRegistry<S> {
    views: Arc<DashMap<ViewId, Arc<InteractiveView<S>>>>,
    next_id: AtomicU64,
    sink: Arc<S>,
    idle_timeout: Duration,
}

impl<S: ViewSink> ViewRegistry<S> {
    pub fn new(sink: Arc<S>) -> Self {
        Self::with_idle_timeout(sink, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(sink: Arc<S>, idle_timeout: Duration) -> Self {
        Self {
            views: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            sink,
            idle_timeout,
        }
    }

    /// Open a view on its first page. The view leaves the registry as soon as it expires.
    pub async fn create(&self, pages: ViewPages) -> Result<ViewId, ViewError> {
        let id = ViewId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let view =
            InteractiveView::open(id, pages, Arc::clone(&self.sink), self.idle_timeout).await?;
        self.views.insert(id, Arc::clone(&view));

        let views = Arc::clone(&self.views);
        tokio::spawn(async move {
            view.expired().await;
            if views.remove(&id).is_some() {
                trace!(view = %id, "expired view dropped");
            }
        });
        Ok(id)
    }

    pub fn get(&self, id: ViewId) -> Option<Arc<InteractiveView<S>>> {
        self.views.get(&id).map(|v| Arc::clone(v.value()))
    }

    pub async fn transition(&self, id: ViewId, action: ViewAction) -> Result<Transition, ViewError> {
        let Some(view) = self.get(id) else {
            trace!(view = %id, %action, "transition on unknown view");
            return Ok(Transition::Expired);
        };
        let outcome = view.transition(action).await?;
        if outcome == Transition::Expired {
            self.views.remove(&id);
        }
        Ok(outcome)
    }

    /// Expire and forget a view. Unknown handles are ignored.
    pub async fn expire(&self, id: ViewId) -> Result<(), ViewError> {
        match self.views.remove(&id) {
            Some((_, view)) => view.expire().await,
            None => Ok(()),
        }
    }

    /// Drop any expired view still registered.
    pub async fn purge_expired(&self) {
        let views: Vec<_> = self
            .views
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        for (id, view) in views {
            if view.expires_at().await.is_none() {
                self.views.remove(&id);
            }
        }
    }

    /// Live view count.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
