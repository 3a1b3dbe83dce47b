//! Command handlers for the navigation context.
//!
//! Each handler loads the session's stream, replays it, executes the command
//! and appends whatever events the command recorded.

use gridwalk_core::aggregate::AggregateRoot;
use gridwalk_core::clock::Clock;
use gridwalk_core::error::DomainError;
use gridwalk_core::event::EventMetadata;
use gridwalk_core::repository::{EventRepository, StoredEvent};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::NavigationSession;
use crate::domain::commands::{
    DeregisterTracks, NavigateToTrack, RegisterTracks, ReturnToLast, StartSession,
};
use crate::domain::events::{EventPayload, NavigationEvent, NavigationEventKind};
use crate::domain::registry::RegistrationConflict;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct NavigationCommandResult {
    /// The session affected by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted. Empty for a no-op.
    pub stored_events: Vec<StoredEvent>,
    /// Entries rejected while merging a registration.
    pub conflicts: Vec<RegistrationConflict>,
}

/// Rebuilds a `NavigationSession` from stored events.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream is empty and
/// `DomainError::Infrastructure` if an event cannot be deserialized or the
/// stream does not replay.
pub(crate) fn reconstitute<P, C>(
    session_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<NavigationSession<P, C>, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let history = existing_events
        .iter()
        .map(|stored| {
            let kind: NavigationEventKind<P, C> = serde_json::from_value(stored.payload.clone())
                .map_err(|e| {
                    DomainError::Infrastructure(format!("event deserialization failed: {e}"))
                })?;
            Ok(NavigationEvent {
                metadata: EventMetadata {
                    event_id: stored.event_id,
                    event_type: stored.event_type.clone(),
                    aggregate_id: stored.aggregate_id,
                    sequence_number: stored.sequence_number,
                    correlation_id: stored.correlation_id,
                    causation_id: stored.causation_id,
                    occurred_at: stored.occurred_at,
                },
                kind,
            })
        })
        .collect::<Result<Vec<_>, DomainError>>()?;

    NavigationSession::from_history(session_id, history)
}

async fn load<P, C>(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<NavigationSession<P, C>, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let existing_events = repo.load_events(session_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(session_id));
    }
    reconstitute(session_id, &existing_events)
}

async fn persist<P: EventPayload, C: EventPayload>(
    session: &NavigationSession<P, C>,
    repo: &dyn EventRepository,
    conflicts: Vec<RegistrationConflict>,
) -> Result<NavigationCommandResult, DomainError> {
    let stored_events = session
        .uncommitted_events()
        .iter()
        .map(StoredEvent::from_event)
        .collect::<Result<Vec<_>, _>>()?;

    if stored_events.is_empty() {
        debug!(session_id = %session.id, "command recorded no events");
    } else {
        repo.append_events(session.id, session.version(), &stored_events)
            .await?;
    }

    Ok(NavigationCommandResult {
        aggregate_id: session.id,
        stored_events,
        conflicts,
    })
}

/// Handles the `StartSession` command: builds a new session and persists its
/// `SessionStarted` event.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the session already exists,
/// `DomainError::Navigation` if the base map is rejected, and
/// `DomainError` if event loading or appending fails.
pub async fn handle_start_session<P, C>(
    command: &StartSession<P>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<NavigationCommandResult, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let existing_events = repo.load_events(command.session_id).await?;
    if !existing_events.is_empty() {
        return Err(DomainError::Validation(format!(
            "navigation session {} already exists",
            command.session_id
        )));
    }

    let session: NavigationSession<P, C> = NavigationSession::start(
        command.session_id,
        command.base_tracks.clone(),
        command.initial_track_id.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&session, repo, Vec::new()).await
}

/// Handles the `NavigateToTrack` command.
///
/// # Errors
///
/// Returns `DomainError::Navigation` if the track does not resolve, and
/// `DomainError` if event loading or appending fails.
pub async fn handle_navigate_to_track<P, C>(
    command: &NavigateToTrack<C>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<NavigationCommandResult, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let mut session: NavigationSession<P, C> = load(command.session_id, repo).await?;

    session.navigate_to_track(
        &command.track_id,
        command.context.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&session, repo, Vec::new()).await
}

/// Handles the `ReturnToLast` command. A single-entry journey produces an
/// empty result.
///
/// # Errors
///
/// Returns `DomainError::Navigation` if the previous entry does not resolve,
/// and `DomainError` if event loading or appending fails.
pub async fn handle_return_to_last<P, C>(
    command: &ReturnToLast,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<NavigationCommandResult, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    let mut session: NavigationSession<P, C> = load(command.session_id, repo).await?;

    session.return_to_last(command.correlation_id, clock)?;

    persist(&session, repo, Vec::new()).await
}

/// Handles the `RegisterTracks` command. Conflicts are reported in the
/// result; they do not fail the command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty owner id, and
/// `DomainError` if event loading or appending fails.
pub async fn handle_register_tracks<P, C>(
    command: &RegisterTracks<P>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<NavigationCommandResult, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    if command.owner_id.is_empty() {
        return Err(DomainError::Validation("owner_id must not be empty".into()));
    }
    let mut session: NavigationSession<P, C> = load(command.session_id, repo).await?;

    let conflicts = session.register_tracks(
        command.owner_id.clone(),
        command.tracks.clone(),
        command.anchor,
        command.correlation_id,
        clock,
    );

    persist(&session, repo, conflicts).await
}

/// Handles the `DeregisterTracks` command. Removing nothing produces an
/// empty result.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty owner id, and
/// `DomainError` if event loading or appending fails.
pub async fn handle_deregister_tracks<P, C>(
    command: &DeregisterTracks,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<NavigationCommandResult, DomainError>
where
    P: EventPayload + DeserializeOwned,
    C: EventPayload + DeserializeOwned,
{
    if command.owner_id.as_deref() == Some("") {
        return Err(DomainError::Validation("owner_id must not be empty".into()));
    }
    let mut session: NavigationSession<P, C> = load(command.session_id, repo).await?;

    session.deregister_tracks(command.owner_id.clone(), command.correlation_id, clock);

    persist(&session, repo, Vec::new()).await
}
