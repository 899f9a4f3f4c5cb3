use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::error::ViewError;
use crate::sink::{SinkError, ViewSink};
use crate::state::{Rejection, Transition, ViewAction, ViewId, ViewPages, ViewState};

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Inner {
    state: ViewState,
    last_rendered: Option<String>,
    deadline: Instant,
}

/// One rendered leaderboard and its pagination state machine.
///
/// Every transition goes through a single async mutex, so concurrent button presses queue
/// and each sees the state left by the previous one.
#[derive(Debug)]
pub struct InteractiveView<S> {
    id: ViewId,
    pages: ViewPages,
    idle_timeout: Duration,
    sink: Arc<S>,
    inner: Mutex<Inner>,
    closed: Notify,
    expired: watch::Sender<bool>,
}

impl<S: ViewSink> InteractiveView<S> {
    /// Draw the first page and start the idle watcher.
    pub async fn open(
        id: ViewId,
        pages: ViewPages,
        sink: Arc<S>,
        idle_timeout: Duration,
    ) -> Result<Arc<Self>, ViewError> {
        if pages.pages.is_empty() {
            return Err(ViewError::NoPages);
        }

        let content = pages.content(0);
        sink.render(id, 0, &content).await?;

        let view = Arc::new(Self {
            id,
            pages,
            idle_timeout,
            sink,
            inner: Mutex::new(Inner {
                state: ViewState::Active { page: 0 },
                last_rendered: Some(content),
                deadline: Instant::now() + idle_timeout,
            }),
            closed: Notify::new(),
            expired: watch::channel(false).0,
        });
        view.spawn_idle_watcher();

        info!(view = %id, pages = view.pages.page_count(), "view opened");
        Ok(view)
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn pages(&self) -> &ViewPages {
        &self.pages
    }

    pub async fn state(&self) -> ViewState {
        self.inner.lock().await.state
    }

    pub async fn expires_at(&self) -> Option<Instant> {
        let inner = self.inner.lock().await;
        matches!(inner.state, ViewState::Active { .. }).then_some(inner.deadline)
    }

    /// Resolves once the view has expired, however that happened.
    pub async fn expired(&self) {
        let mut rx = self.expired.subscribe();
        let _ = rx.wait_for(|expired| *expired).await;
    }

    /// Apply a navigation action. A no-op once expired.
    pub async fn transition(&self, action: ViewAction) -> Result<Transition, ViewError> {
        let mut inner = self.inner.lock().await;
        let ViewState::Active { page } = inner.state else {
            trace!(view = %self.id, %action, "transition on expired view");
            return Ok(Transition::Expired);
        };

        let last = self.pages.last_page();
        let target = match action {
            ViewAction::First => 0,
            ViewAction::Prev => page.saturating_sub(1),
            ViewAction::Next => (page + 1).min(last),
            ViewAction::Last => last,
            ViewAction::JumpToOwner => match self.pages.owner_page() {
                Some(owner) => owner,
                None => return Ok(Transition::Rejected(Rejection::NoPosition)),
            },
        };
        inner.deadline = Instant::now() + self.idle_timeout;

        let content = self.pages.content(target);
        if inner.last_rendered.as_deref() == Some(content.as_str()) {
            inner.state = ViewState::Active { page: target };
            return Ok(Transition::Unchanged { page: target });
        }

        match self.sink.render(self.id, target, &content).await {
            Ok(()) => {
                trace!(view = %self.id, %action, from = page, to = target, "view rendered");
                inner.state = ViewState::Active { page: target };
                inner.last_rendered = Some(content);
                Ok(Transition::Rendered { page: target })
            }
            Err(SinkError::Gone) => {
                debug!(view = %self.id, "rendered output vanished, expiring view");
                inner.state = ViewState::Expired;
                self.closed.notify_one();
                self.expired.send_replace(true);
                Ok(Transition::Expired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Move to `Expired` and tear down the rendered output. Idempotent.
    pub async fn expire(&self) -> Result<(), ViewError> {
        let mut inner = self.inner.lock().await;
        if inner.state == ViewState::Expired {
            return Ok(());
        }
        inner.state = ViewState::Expired;
        self.closed.notify_one();
        self.expired.send_replace(true);

        match self.sink.teardown(self.id).await {
            Ok(()) | Err(SinkError::Gone) => {
                info!(view = %self.id, "view expired");
                Ok(())
            }
            Err(err) => {
                warn!(view = %self.id, %err, "view teardown failed");
                Err(err.into())
            }
        }
    }

    fn spawn_idle_watcher(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let deadline = {
                    let inner = this.inner.lock().await;
                    if inner.state == ViewState::Expired {
                        break;
                    }
                    inner.deadline
                };

                tokio::select! {
                    _ = this.closed.notified() => break,
                    _ = tokio::time::sleep_until(deadline) => {
                        let idle = this.inner.lock().await.deadline <= Instant::now();
                        if idle {
                            if let Err(err) = this.expire().await {
                                debug!(view = %this.id, %err, "idle expiry failed");
                            }
                            break;
                        }
                    }
                }
            }
        });
    }
}
