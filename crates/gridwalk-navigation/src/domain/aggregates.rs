//! Aggregate root for the navigation context.

use gridwalk_core::aggregate::AggregateRoot;
use gridwalk_core::clock::Clock;
use gridwalk_core::error::{DomainError, NavigationError};
use gridwalk_core::event::EventMetadata;
use gridwalk_core::position::Position;
use gridwalk_core::track::{OwnerId, TrackId, TrackMap, translate_tracks};
use tracing::error;
use uuid::Uuid;

use super::events::{
    EventPayload, NavigationEvent, NavigationEventKind, ReturnedToLast, SessionStarted,
    TrackNavigated, TracksDeregistered, TracksRegistered,
};
use super::registry::RegistrationConflict;
use super::state::NavigationState;

/// An event-sourced navigation session.
///
/// Every successful mutation of the wrapped [`NavigationState`] is recorded
/// as a [`NavigationEvent`]. Rejected commands and no-ops record nothing.
#[derive(Debug)]
pub struct NavigationSession<P, C> {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Number of events already persisted.
    pub(crate) version: i64,
    state: NavigationState<P, C>,
    uncommitted_events: Vec<NavigationEvent<P, C>>,
}

impl<P: EventPayload, C: EventPayload> NavigationSession<P, C> {
    /// Creates a session and records `SessionStarted`.
    ///
    /// # Errors
    ///
    /// Returns the `NavigationError` from [`NavigationState::new`] when the
    /// initial track is missing, off the origin, or the base overlaps.
    pub fn start(
        id: Uuid,
        base_tracks: TrackMap<P>,
        initial_track_id: TrackId,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Self, NavigationError> {
        let state = NavigationState::new(base_tracks.clone(), initial_track_id.clone())?;
        let mut session = Self {
            id,
            version: 0,
            state,
            uncommitted_events: Vec::new(),
        };
        session.record(
            NavigationEventKind::SessionStarted(SessionStarted {
                session_id: id,
                base_tracks,
                initial_track_id,
            }),
            correlation_id,
            clock,
        );
        Ok(session)
    }

    /// Rebuilds a session from its persisted events.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` for an empty history and
    /// `DomainError::Infrastructure` if the history does not open with
    /// `SessionStarted` or that event no longer builds a valid state.
    pub fn from_history(
        id: Uuid,
        history: impl IntoIterator<Item = NavigationEvent<P, C>>,
    ) -> Result<Self, DomainError> {
        let mut history = history.into_iter();
        let Some(first) = history.next() else {
            return Err(DomainError::AggregateNotFound(id));
        };
        let NavigationEventKind::SessionStarted(started) = &first.kind else {
            return Err(DomainError::Infrastructure(format!(
                "navigation session {id} does not begin with a session_started event"
            )));
        };

        let state = NavigationState::new(
            started.base_tracks.clone(),
            started.initial_track_id.clone(),
        )
        .map_err(|e| {
            DomainError::Infrastructure(format!("navigation session {id} cannot be replayed: {e}"))
        })?;

        let mut session = Self {
            id,
            version: 1,
            state,
            uncommitted_events: Vec::new(),
        };
        for event in history {
            session.apply(&event);
        }
        Ok(session)
    }

    /// The navigation state as of the last applied or recorded event.
    #[must_use]
    pub fn state(&self) -> &NavigationState<P, C> {
        &self.state
    }

    /// Moves to `track_id`, recording `TrackNavigated`.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if the track is not
    /// in the flattened registry.
    pub fn navigate_to_track(
        &mut self,
        track_id: &str,
        context: Option<C>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), NavigationError> {
        let position = self.state.resolve(track_id)?;
        self.record(
            NavigationEventKind::TrackNavigated(TrackNavigated {
                session_id: self.id,
                track_id: track_id.to_owned(),
                position,
                context,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Steps back one journey entry, recording `ReturnedToLast`. Records
    /// nothing when the journey holds a single entry.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if the previous entry
    /// does not resolve.
    pub fn return_to_last(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), NavigationError> {
        let Some((track_id, position)) = self.state.return_target()? else {
            return Ok(());
        };
        let left_track_id = self
            .state
            .journey_stack()
            .last()
            .cloned()
            .unwrap_or_default();
        self.record(
            NavigationEventKind::ReturnedToLast(ReturnedToLast {
                session_id: self.id,
                left_track_id,
                track_id,
                position,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Registers an overlay for `owner_id`, recording `TracksRegistered`
    /// with the translated tracks. Returns the owner's rejected entries.
    pub fn register_tracks(
        &mut self,
        owner_id: OwnerId,
        tracks: TrackMap<P>,
        anchor: Option<Position>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Vec<RegistrationConflict> {
        let anchor = self.state.resolve_anchor(anchor);
        self.record(
            NavigationEventKind::TracksRegistered(TracksRegistered {
                session_id: self.id,
                owner_id: owner_id.clone(),
                anchor,
                tracks: translate_tracks(tracks, anchor),
            }),
            correlation_id,
            clock,
        );
        self.state.conflicts_for(&owner_id)
    }

    /// Removes one owner's overlay or, without an owner, every overlay.
    /// Records `TracksDeregistered` only when something was removed.
    pub fn deregister_tracks(
        &mut self,
        owner_id: Option<OwnerId>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let has_target = match owner_id.as_deref() {
            Some(owner_id) => self.state.overlays().get(owner_id).is_some(),
            None => !self.state.overlays().is_empty(),
        };
        if !has_target {
            return;
        }
        self.record(
            NavigationEventKind::TracksDeregistered(TracksDeregistered {
                session_id: self.id,
                owner_id,
            }),
            correlation_id,
            clock,
        );
    }

    fn record(
        &mut self,
        kind: NavigationEventKind<P, C>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let event = NavigationEvent {
            metadata: EventMetadata::caused_by_command(
                kind.event_type(),
                self.id,
                self.next_sequence_number(),
                correlation_id,
                clock,
            ),
            kind,
        };
        self.transition(&event.kind);
        self.uncommitted_events.push(event);
    }

    fn transition(&mut self, kind: &NavigationEventKind<P, C>) {
        match kind {
            NavigationEventKind::SessionStarted(started) => {
                match NavigationState::new(
                    started.base_tracks.clone(),
                    started.initial_track_id.clone(),
                ) {
                    Ok(state) => self.state = state,
                    Err(e) => error!(session_id = %self.id, error = %e, "ignoring invalid session_started event"),
                }
            }
            NavigationEventKind::TrackNavigated(navigated) => {
                self.state.enter(
                    navigated.track_id.clone(),
                    navigated.position,
                    navigated.context.clone(),
                );
            }
            NavigationEventKind::ReturnedToLast(returned) => {
                self.state.retreat(returned.position);
            }
            NavigationEventKind::TracksRegistered(registered) => {
                self.state
                    .install_overlay(registered.owner_id.clone(), registered.tracks.clone());
            }
            NavigationEventKind::TracksDeregistered(deregistered) => {
                match deregistered.owner_id.as_deref() {
                    Some(owner_id) => self.state.remove_overlay(owner_id),
                    None => self.state.clear_overlays(),
                };
            }
        }
    }
}

impl<P: EventPayload, C: EventPayload> AggregateRoot for NavigationSession<P, C> {
    type Event = NavigationEvent<P, C>;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.transition(&event.kind);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridwalk_core::event::DomainEvent;
    use gridwalk_test_support::fixtures::{cross_tracks, tracks_at};
    use gridwalk_test_support::{FixedClock, fixed_now};

    use crate::domain::events::{
        RETURNED_TO_LAST_EVENT_TYPE, SESSION_STARTED_EVENT_TYPE, TRACK_NAVIGATED_EVENT_TYPE,
        TRACKS_DEREGISTERED_EVENT_TYPE, TRACKS_REGISTERED_EVENT_TYPE,
    };

    type Session = NavigationSession<&'static str, String>;

    fn started(clock: &FixedClock) -> Session {
        NavigationSession::start(
            Uuid::new_v4(),
            cross_tracks(),
            "start".to_owned(),
            Uuid::new_v4(),
            clock,
        )
        .unwrap()
    }

    fn event_types(session: &Session) -> Vec<&'static str> {
        session
            .uncommitted_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect()
    }

    #[test]
    fn test_start_records_session_started_event() {
        // Arrange
        let session_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let clock = FixedClock::default();

        // Act
        let session: Session = NavigationSession::start(
            session_id,
            cross_tracks(),
            "start".to_owned(),
            correlation_id,
            &clock,
        )
        .unwrap();

        // Assert
        let events = session.uncommitted_events();
        assert_eq!(events.len(), 1);

        let meta = events[0].metadata();
        assert_eq!(events[0].event_type(), SESSION_STARTED_EVENT_TYPE);
        assert_eq!(meta.aggregate_id, session_id);
        assert_eq!(meta.sequence_number, 1);
        assert_eq!(meta.correlation_id, correlation_id);
        assert_eq!(meta.causation_id, correlation_id);
        assert_eq!(meta.occurred_at, fixed_now());
        assert_eq!(session.version(), 0);
        assert!(session.state().is_current_track("start"));
    }

    #[test]
    fn test_start_rejects_initial_track_off_origin() {
        let result: Result<Session, _> = NavigationSession::start(
            Uuid::new_v4(),
            cross_tracks(),
            "right".to_owned(),
            Uuid::new_v4(),
            &FixedClock::default(),
        );

        assert!(matches!(
            result,
            Err(NavigationError::InitialTrackNotAtOrigin { .. })
        ));
    }

    #[test]
    fn test_navigate_records_event_with_resolved_position() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);

        // Act
        session
            .navigate_to_track("left", Some("menu".to_owned()), Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        assert_eq!(
            event_types(&session),
            vec![SESSION_STARTED_EVENT_TYPE, TRACK_NAVIGATED_EVENT_TYPE]
        );
        let event = &session.uncommitted_events()[1];
        assert_eq!(event.metadata().sequence_number, 2);
        match &event.kind {
            NavigationEventKind::TrackNavigated(payload) => {
                assert_eq!(payload.track_id, "left");
                assert_eq!(payload.position, Position::new(-1, 0));
                assert_eq!(payload.context.as_deref(), Some("menu"));
            }
            other => panic!("expected TrackNavigated, got {other:?}"),
        }
        assert_eq!(session.state().current_position(), Position::new(-1, 0));
    }

    #[test]
    fn test_navigate_to_missing_track_records_nothing() {
        let clock = FixedClock::default();
        let mut session = started(&clock);

        let result = session.navigate_to_track("missing", None, Uuid::new_v4(), &clock);

        assert!(matches!(
            result,
            Err(NavigationError::InvalidTrackReference { .. })
        ));
        assert_eq!(event_types(&session), vec![SESSION_STARTED_EVENT_TYPE]);
    }

    #[test]
    fn test_return_records_left_and_restored_tracks() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);
        session
            .navigate_to_track("right", None, Uuid::new_v4(), &clock)
            .unwrap();

        // Act
        session.return_to_last(Uuid::new_v4(), &clock).unwrap();

        // Assert
        let event = &session.uncommitted_events()[2];
        assert_eq!(event.event_type(), RETURNED_TO_LAST_EVENT_TYPE);
        assert_eq!(event.metadata().sequence_number, 3);
        match &event.kind {
            NavigationEventKind::ReturnedToLast(payload) => {
                assert_eq!(payload.left_track_id, "right");
                assert_eq!(payload.track_id, "start");
                assert_eq!(payload.position, Position::ORIGIN);
            }
            other => panic!("expected ReturnedToLast, got {other:?}"),
        }
        assert_eq!(session.state().journey_stack(), &["start".to_owned()]);
    }

    #[test]
    fn test_return_with_single_entry_records_nothing() {
        let clock = FixedClock::default();
        let mut session = started(&clock);

        session.return_to_last(Uuid::new_v4(), &clock).unwrap();

        assert_eq!(event_types(&session), vec![SESSION_STARTED_EVENT_TYPE]);
    }

    #[test]
    fn test_register_records_translated_tracks_and_reports_conflicts() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);
        session
            .navigate_to_track("left", None, Uuid::new_v4(), &clock)
            .unwrap();

        // Act
        let conflicts = session.register_tracks(
            "app".to_owned(),
            tracks_at(&[("x", (0, 1)), ("clash", (2, 0))]),
            None,
            Uuid::new_v4(),
            &clock,
        );

        // Assert
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].track_id(), "clash");
        match &session.uncommitted_events()[2].kind {
            NavigationEventKind::TracksRegistered(payload) => {
                assert_eq!(payload.owner_id, "app");
                assert_eq!(payload.anchor, Position::new(-1, 0));
                assert_eq!(payload.tracks["x"].position, Position::new(-1, 1));
                assert_eq!(payload.tracks["clash"].position, Position::new(1, 0));
            }
            other => panic!("expected TracksRegistered, got {other:?}"),
        }
    }

    #[test]
    fn test_deregister_records_only_when_something_is_removed() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);

        // Act
        session.deregister_tracks(Some("app".to_owned()), Uuid::new_v4(), &clock);
        session.deregister_tracks(None, Uuid::new_v4(), &clock);
        session.register_tracks(
            "app".to_owned(),
            tracks_at(&[("x", (0, 1))]),
            None,
            Uuid::new_v4(),
            &clock,
        );
        session.deregister_tracks(None, Uuid::new_v4(), &clock);

        // Assert
        assert_eq!(
            event_types(&session),
            vec![
                SESSION_STARTED_EVENT_TYPE,
                TRACKS_REGISTERED_EVENT_TYPE,
                TRACKS_DEREGISTERED_EVENT_TYPE,
            ]
        );
        assert!(session.state().track("x").is_none());
    }

    #[test]
    fn test_from_history_replays_to_the_same_state() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);
        session.register_tracks(
            "app".to_owned(),
            tracks_at(&[("x", (0, 1))]),
            None,
            Uuid::new_v4(),
            &clock,
        );
        session
            .navigate_to_track("x", Some("ctx".to_owned()), Uuid::new_v4(), &clock)
            .unwrap();
        session
            .navigate_to_track("right", None, Uuid::new_v4(), &clock)
            .unwrap();
        session.return_to_last(Uuid::new_v4(), &clock).unwrap();
        session.deregister_tracks(None, Uuid::new_v4(), &clock);
        let history = session.uncommitted_events().to_vec();

        // Act
        let replayed: Session = NavigationSession::from_history(session.id, history).unwrap();

        // Assert
        assert_eq!(replayed.version(), 6);
        assert!(replayed.uncommitted_events().is_empty());
        assert_eq!(replayed.state().journey_stack(), session.state().journey_stack());
        assert_eq!(
            replayed.state().current_position(),
            session.state().current_position()
        );
        assert_eq!(replayed.state().context_map(), session.state().context_map());
        assert_eq!(replayed.state().all_tracks(), session.state().all_tracks());
        assert_eq!(replayed.state().context("x"), Some(&Some("ctx".to_owned())));
    }

    #[test]
    fn test_from_history_rejects_empty_history() {
        let session_id = Uuid::new_v4();

        let result: Result<Session, _> = NavigationSession::from_history(session_id, Vec::new());

        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, session_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_from_history_rejects_stream_without_session_started() {
        // Arrange
        let clock = FixedClock::default();
        let mut session = started(&clock);
        session
            .navigate_to_track("left", None, Uuid::new_v4(), &clock)
            .unwrap();
        let history = session.uncommitted_events()[1..].to_vec();

        // Act
        let result: Result<Session, _> = NavigationSession::from_history(session.id, history);

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[test]
    fn test_sequence_numbers_continue_after_replay() {
        let clock = FixedClock::default();
        let session = started(&clock);
        let mut replayed: Session =
            NavigationSession::from_history(session.id, session.uncommitted_events().to_vec())
                .unwrap();

        replayed
            .navigate_to_track("left", None, Uuid::new_v4(), &clock)
            .unwrap();

        assert_eq!(replayed.uncommitted_events()[0].metadata().sequence_number, 2);
    }
}
