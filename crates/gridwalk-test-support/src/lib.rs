//! Shared test fakes and fixtures for the gridwalk navigation engine.

mod clock;
pub mod fixtures;
mod repository;

pub use clock::{FixedClock, fixed_now};
pub use repository::{EmptyEventRepository, FailingEventRepository, RecordingEventRepository};
