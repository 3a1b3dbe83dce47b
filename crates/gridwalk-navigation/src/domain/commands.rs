//! Commands for the navigation context.

use std::fmt::Debug;

use gridwalk_core::command::Command;
use gridwalk_core::position::Position;
use gridwalk_core::track::{OwnerId, TrackId, TrackMap};
use uuid::Uuid;

/// Command to create a navigation session.
#[derive(Debug, Clone)]
pub struct StartSession<P> {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The new session's identifier.
    pub session_id: Uuid,
    /// The base track map.
    pub base_tracks: TrackMap<P>,
    /// Track the journey starts on; must sit at the origin.
    pub initial_track_id: TrackId,
}

impl<P: Send + Sync + Debug> Command for StartSession<P> {
    fn command_type(&self) -> &'static str {
        "navigation.start_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }
}

/// Command to move to a track.
#[derive(Debug, Clone)]
pub struct NavigateToTrack<C> {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The target track.
    pub track_id: TrackId,
    /// Context to store for the target.
    pub context: Option<C>,
}

impl<C: Send + Sync + Debug> Command for NavigateToTrack<C> {
    fn command_type(&self) -> &'static str {
        "navigation.navigate_to_track"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }
}

/// Command to step back one journey entry.
#[derive(Debug, Clone, Copy)]
pub struct ReturnToLast {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for ReturnToLast {
    fn command_type(&self) -> &'static str {
        "navigation.return_to_last"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }
}

/// Command to register an overlay.
#[derive(Debug, Clone)]
pub struct RegisterTracks<P> {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The registering owner.
    pub owner_id: OwnerId,
    /// Tracks relative to the anchor.
    pub tracks: TrackMap<P>,
    /// Anchor; defaults to the current position.
    pub anchor: Option<Position>,
}

impl<P: Send + Sync + Debug> Command for RegisterTracks<P> {
    fn command_type(&self) -> &'static str {
        "navigation.register_tracks"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }
}

/// Command to remove one owner's overlay, or all of them.
#[derive(Debug, Clone)]
pub struct DeregisterTracks {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// Owner to remove; `None` removes every overlay.
    pub owner_id: Option<OwnerId>,
}

impl Command for DeregisterTracks {
    fn command_type(&self) -> &'static str {
        "navigation.deregister_tracks"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn aggregate_id(&self) -> Uuid {
        self.session_id
    }
}
