//! Command abstractions.

use uuid::Uuid;

/// A request to change one navigation session.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name used in logs, e.g. `navigation.navigate_to_track`.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried into every event the command produces.
    fn correlation_id(&self) -> Uuid;

    /// The session the command targets.
    fn aggregate_id(&self) -> Uuid;
}
