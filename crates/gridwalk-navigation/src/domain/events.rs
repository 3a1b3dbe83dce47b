//! Domain events for the navigation context.

use std::fmt::Debug;

use gridwalk_core::error::DomainError;
use gridwalk_core::event::{DomainEvent, EventMetadata};
use gridwalk_core::position::Position;
use gridwalk_core::track::{OwnerId, TrackId, TrackMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for [`SessionStarted`].
pub const SESSION_STARTED_EVENT_TYPE: &str = "navigation.session_started";
/// Event type for [`TrackNavigated`].
pub const TRACK_NAVIGATED_EVENT_TYPE: &str = "navigation.track_navigated";
/// Event type for [`ReturnedToLast`].
pub const RETURNED_TO_LAST_EVENT_TYPE: &str = "navigation.returned_to_last";
/// Event type for [`TracksRegistered`].
pub const TRACKS_REGISTERED_EVENT_TYPE: &str = "navigation.tracks_registered";
/// Event type for [`TracksDeregistered`].
pub const TRACKS_DEREGISTERED_EVENT_TYPE: &str = "navigation.tracks_deregistered";

/// Bounds shared by payload and context types that travel inside events.
pub trait EventPayload: Clone + Serialize + Send + Sync + Debug {}

impl<T> EventPayload for T where T: Clone + Serialize + Send + Sync + Debug {}

/// Emitted once, when a session is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStarted<P> {
    /// The session identifier.
    pub session_id: Uuid,
    /// The base track map.
    pub base_tracks: TrackMap<P>,
    /// Track the journey starts on.
    pub initial_track_id: TrackId,
}

/// Emitted when the session moves to a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackNavigated<C> {
    /// The session identifier.
    pub session_id: Uuid,
    /// The track moved to.
    pub track_id: TrackId,
    /// Where that track sat when it was resolved.
    pub position: Position,
    /// Context stored for the track.
    pub context: Option<C>,
}

/// Emitted when the session steps back one journey entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedToLast {
    /// The session identifier.
    pub session_id: Uuid,
    /// The track popped off the journey.
    pub left_track_id: TrackId,
    /// The track returned to.
    pub track_id: TrackId,
    /// Where the returned-to track sat.
    pub position: Position,
}

/// Emitted when an owner registers an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracksRegistered<P> {
    /// The session identifier.
    pub session_id: Uuid,
    /// The registering owner.
    pub owner_id: OwnerId,
    /// Anchor the tracks were translated by.
    pub anchor: Position,
    /// The tracks, already translated.
    pub tracks: TrackMap<P>,
}

/// Emitted when overlays are removed. No owner means all overlays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracksDeregistered {
    /// The session identifier.
    pub session_id: Uuid,
    /// The owner removed, or `None` for a bulk removal.
    pub owner_id: Option<OwnerId>,
}

/// Event payload variants for the navigation context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NavigationEventKind<P, C> {
    /// A session was created.
    SessionStarted(SessionStarted<P>),
    /// The session moved to a track.
    TrackNavigated(TrackNavigated<C>),
    /// The session stepped back.
    ReturnedToLast(ReturnedToLast),
    /// An overlay was registered.
    TracksRegistered(TracksRegistered<P>),
    /// Overlays were removed.
    TracksDeregistered(TracksDeregistered),
}

impl<P, C> NavigationEventKind<P, C> {
    /// The event type name of this variant.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionStarted(_) => SESSION_STARTED_EVENT_TYPE,
            Self::TrackNavigated(_) => TRACK_NAVIGATED_EVENT_TYPE,
            Self::ReturnedToLast(_) => RETURNED_TO_LAST_EVENT_TYPE,
            Self::TracksRegistered(_) => TRACKS_REGISTERED_EVENT_TYPE,
            Self::TracksDeregistered(_) => TRACKS_DEREGISTERED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the navigation context.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent<P, C> {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: NavigationEventKind<P, C>,
}

impl<P: EventPayload, C: EventPayload> DomainEvent for NavigationEvent<P, C> {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(&self.kind).map_err(|e| {
            DomainError::Infrastructure(format!("event serialization failed: {e}"))
        })
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use gridwalk_test_support::{FixedClock, fixed_now};

    fn navigated<C>(context: Option<C>) -> NavigationEvent<(), C> {
        let session_id = Uuid::new_v4();
        NavigationEvent {
            metadata: EventMetadata::caused_by_command(
                TRACK_NAVIGATED_EVENT_TYPE,
                session_id,
                2,
                Uuid::new_v4(),
                &FixedClock::default(),
            ),
            kind: NavigationEventKind::TrackNavigated(TrackNavigated {
                session_id,
                track_id: "left".to_owned(),
                position: Position::new(-1, 0),
                context,
            }),
        }
    }

    #[test]
    fn test_event_type_follows_kind() {
        let event = navigated::<u8>(None);

        assert_eq!(event.event_type(), TRACK_NAVIGATED_EVENT_TYPE);
        assert_eq!(event.metadata().occurred_at, fixed_now());
        assert_eq!(event.metadata().sequence_number, 2);
    }

    #[test]
    fn test_to_payload_serializes_kind_with_context() {
        let event = navigated(Some(serde_json::json!({ "from": "menu" })));

        let payload = event.to_payload().unwrap();

        assert_eq!(payload["TrackNavigated"]["track_id"], "left");
        assert_eq!(payload["TrackNavigated"]["position"], serde_json::json!({ "x": -1, "y": 0 }));
        assert_eq!(payload["TrackNavigated"]["context"]["from"], "menu");
    }

    #[test]
    fn test_to_payload_reports_unserializable_context() {
        // JSON objects need string keys.
        let mut context = HashMap::new();
        context.insert((1, 2), "cell");
        let event = navigated(Some(context));

        let result = event.to_payload();

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
