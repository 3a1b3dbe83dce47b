//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// An event-sourced aggregate: state is only ever changed by applying events.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate records and replays.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the number of events already persisted for this aggregate.
    fn version(&self) -> i64;

    /// Applies an event to the in-memory state.
    fn apply(&mut self, event: &Self::Event);

    /// Returns events recorded since the last persistence.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Sequence number the next recorded event must carry.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version() + self.uncommitted_events().len() as i64 + 1
    }
}
