//! Query handlers for the navigation context.
//!
//! Queries replay a session's stream and return read-only view DTOs.

use gridwalk_core::aggregate::AggregateRoot;
use gridwalk_core::error::DomainError;
use gridwalk_core::position::Position;
use gridwalk_core::repository::EventRepository;
use gridwalk_core::track::{TrackEntry, TrackId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::events::EventPayload;
use crate::domain::registry::RegistrationConflict;
use crate::domain::state::{ContextStore, ReturnDirection};

/// Read-only view of a navigation session.
#[derive(Debug, Serialize)]
pub struct NavigationView<P, C> {
    /// The session identifier.
    pub session_id: Uuid,
    /// Visit history, oldest first.
    pub journey_stack: Vec<TrackId>,
    /// Position set by the last navigation or return.
    pub current_position: Position,
    /// The track at the current position, if any.
    pub current_track: Option<TrackEntry<P>>,
    /// The flattened registry, base tracks first.
    pub all_tracks: Vec<TrackEntry<P>>,
    /// Context stored per track.
    pub context_map: ContextStore<C>,
    /// Direction `return` would move in, when there is somewhere to go.
    pub return_direction: Option<ReturnDirection>,
    /// Entries the last merge rejected.
    pub conflicts: Vec<RegistrationConflict>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a navigation session by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_navigation_by_id<P, C>(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<NavigationView<P, C>, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let stored_events = repo.load_events(session_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::AggregateNotFound(session_id));
    }
    let session = command_handlers::reconstitute::<P, C>(session_id, &stored_events)?;
    let snapshot = session.state().snapshot();

    Ok(NavigationView {
        session_id,
        journey_stack: snapshot.journey_stack().to_vec(),
        current_position: snapshot.current_position(),
        current_track: snapshot.current_track().cloned(),
        all_tracks: snapshot.all_tracks().to_vec(),
        context_map: snapshot.context_map().clone(),
        return_direction: snapshot.return_direction(),
        conflicts: snapshot.conflicts().to_vec(),
        version: session.version(),
    })
}

#[cfg(test)]
mod tests {
    use gridwalk_core::aggregate::AggregateRoot;
    use gridwalk_core::error::DomainError;
    use gridwalk_core::position::Position;
    use gridwalk_core::repository::StoredEvent;
    use gridwalk_test_support::fixtures::{cross_tracks, owned, tracks_at};
    use gridwalk_test_support::{EmptyEventRepository, FixedClock, RecordingEventRepository};
    use uuid::Uuid;

    use crate::application::query_handlers::get_navigation_by_id;
    use crate::domain::aggregates::NavigationSession;
    use crate::domain::state::ReturnDirection;

    type Context = serde_json::Value;

    #[tokio::test]
    async fn test_get_navigation_by_id_returns_replayed_view() {
        // Arrange
        let session_id = Uuid::new_v4();
        let clock = FixedClock::default();
        let mut session: NavigationSession<String, Context> = NavigationSession::start(
            session_id,
            owned(cross_tracks()),
            "start".to_owned(),
            Uuid::new_v4(),
            &clock,
        )
        .unwrap();
        session.register_tracks(
            "app".to_owned(),
            owned(tracks_at(&[("below", (0, 1)), ("clash", (1, 0))])),
            None,
            Uuid::new_v4(),
            &clock,
        );
        session
            .navigate_to_track("right", Some(serde_json::json!({ "tab": 2 })), Uuid::new_v4(), &clock)
            .unwrap();
        let events: Vec<StoredEvent> = session
            .uncommitted_events()
            .iter()
            .map(|event| StoredEvent::from_event(event).unwrap())
            .collect();
        let repo = RecordingEventRepository::with_stream(events);

        // Act
        let view = get_navigation_by_id::<String, Context>(session_id, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(view.session_id, session_id);
        assert_eq!(view.version, 3);
        assert_eq!(view.journey_stack, vec!["start".to_owned(), "right".to_owned()]);
        assert_eq!(view.current_position, Position::new(1, 0));
        assert_eq!(view.current_track.unwrap().id, "right");
        let ids: Vec<&str> = view.all_tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "left", "right", "below"]);
        assert_eq!(view.context_map["right"], Some(serde_json::json!({ "tab": 2 })));
        assert_eq!(view.return_direction, Some(ReturnDirection::Left));
        assert_eq!(view.conflicts.len(), 1);
        assert_eq!(view.conflicts[0].track_id(), "clash");
    }

    #[tokio::test]
    async fn test_get_navigation_by_id_serializes_view() {
        // Arrange
        let session_id = Uuid::new_v4();
        let session: NavigationSession<String, Context> = NavigationSession::start(
            session_id,
            owned(cross_tracks()),
            "start".to_owned(),
            Uuid::new_v4(),
            &FixedClock::default(),
        )
        .unwrap();
        let repo = RecordingEventRepository::with_stream(vec![
            StoredEvent::from_event(&session.uncommitted_events()[0]).unwrap(),
        ]);

        // Act
        let view = get_navigation_by_id::<String, Context>(session_id, &repo)
            .await
            .unwrap();
        let json = serde_json::to_value(&view).unwrap();

        // Assert
        assert_eq!(json["current_position"], serde_json::json!({ "x": 0, "y": 0 }));
        assert_eq!(json["current_track"]["id"], "start");
        assert_eq!(json["return_direction"], serde_json::Value::Null);
        assert_eq!(json["version"], 1);
    }

    #[tokio::test]
    async fn test_get_navigation_by_id_returns_not_found_when_no_events() {
        // Arrange
        let session_id = Uuid::new_v4();
        let repo = EmptyEventRepository;

        // Act
        let result = get_navigation_by_id::<String, Context>(session_id, &repo).await;

        // Assert
        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, session_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }
}
