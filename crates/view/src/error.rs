use thiserror::Error;

use crate::sink::SinkError;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("leaderboard has no pages")]
    NoPages,
    #[error(transparent)]
    Sink(#[from] SinkError),
}
