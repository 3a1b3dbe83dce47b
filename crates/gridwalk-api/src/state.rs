//! Shared application state.

use std::sync::Arc;

use gridwalk_core::clock::Clock;
use gridwalk_core::repository::EventRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock stamped into recorded events.
    pub clock: Arc<dyn Clock>,
    /// Store holding every navigation session's event stream.
    pub event_repository: Arc<dyn EventRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, event_repository: Arc<dyn EventRepository>) -> Self {
        Self {
            clock,
            event_repository,
        }
    }
}
