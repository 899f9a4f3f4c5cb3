use async_trait::async_trait;
use thiserror::Error;

use crate::state::ViewId;

#[derive(Debug, Error)]
pub enum SinkError {
    /// The rendered output no longer exists (deleted message, closed channel).
    #[error("rendered output is gone")]
    Gone,
    #[error("sink failure: {0}")]
    Failed(String),
}

/// Where a view's pages are drawn. Rendering itself is not tally's concern.
#[async_trait]
pub trait ViewSink: Send + Sync + 'static {
    async fn render(&self, view: ViewId, page: usize, content: &str) -> Result<(), SinkError>;

    /// Remove the rendered output. Returning [`SinkError::Gone`] is not a failure.
    async fn teardown(&self, view: ViewId) -> Result<(), SinkError>;
}

/// Sink that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl ViewSink for NullSink {
    async fn render(&self, _view: ViewId, _page: usize, _content: &str) -> Result<(), SinkError> {
        Ok(())
    }

    async fn teardown(&self, _view: ViewId) -> Result<(), SinkError> {
        Ok(())
    }
}
