//! Error taxonomy shared by the navigation engine and its hosts.

use thiserror::Error;
use uuid::Uuid;

use crate::position::Position;

/// Recoverable failures of the navigation state machine.
///
/// None of these leave the engine in a partially updated state: the
/// operation that reported them did not change anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// A navigation target is not part of the current flattened registry.
    #[error("invalid track reference: {track_id}")]
    InvalidTrackReference {
        /// The id that failed to resolve.
        track_id: String,
    },

    /// The initial track id does not exist in the base map.
    #[error("initial track {track_id} is not in the base track map")]
    InitialTrackMissing {
        /// The requested initial track id.
        track_id: String,
    },

    /// The initial track exists but is not placed at the origin.
    #[error("initial track {track_id} must be at (0, 0), found {position}")]
    InitialTrackNotAtOrigin {
        /// The requested initial track id.
        track_id: String,
        /// Where the track actually sits.
        position: Position,
    },

    /// Two base tracks were declared on the same cell.
    #[error("base track {track_id} overlaps {occupant} at {position}")]
    OverlappingBaseTracks {
        /// The later of the two tracks.
        track_id: String,
        /// The track declared first on that cell.
        occupant: String,
        /// The shared cell.
        position: Position,
    },
}

/// Top-level error type for the hosted, event-sourced layer.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A navigation session was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// Malformed command input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The navigation state machine rejected the command.
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
