use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::sink::{SinkError, ViewSink};
use crate::state::ViewId;

/// Records every call; `delete_output` simulates the rendered message being removed.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    renders: Mutex<Vec<(ViewId, usize, String)>>,
    teardowns: AtomicUsize,
    gone: AtomicBool,
}

impl RecordingSink {
    pub(crate) fn render_count(&self) -> usize {
        self.renders.lock().len()
    }

    pub(crate) fn renders(&self) -> Vec<(ViewId, usize, String)> {
        self.renders.lock().clone()
    }

    pub(crate) fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_output(&self) {
        self.gone.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ViewSink for RecordingSink {
    async fn render(&self, view: ViewId, page: usize, content: &str) -> Result<(), SinkError> {
        if self.gone.load(Ordering::SeqCst) {
            return Err(SinkError::Gone);
        }
        self.renders.lock().push((view, page, content.to_owned()));
        Ok(())
    }

    async fn teardown(&self, _view: ViewId) -> Result<(), SinkError> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.gone.swap(true, Ordering::SeqCst) {
            return Err(SinkError::Gone);
        }
        Ok(())
    }
}
