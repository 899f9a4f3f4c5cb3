//! Interactive leaderboard views.
//!
//! A view is an explicit state machine (`Active(page)` → `Expired`) with one serialized
//! entry point. It expires after an idle period and tears its output down exactly once.

mod error;
mod registry;
mod sink;
mod state;
mod view;

#[cfg(test)]
mod test_utils;

pub use error::ViewError;
pub use registry::ViewRegistry;
pub use sink::{NullSink, SinkError, ViewSink};
pub use state::{Rejection, Transition, ViewAction, ViewId, ViewPages, ViewState};
pub use view::{DEFAULT_IDLE_TIMEOUT, InteractiveView};
