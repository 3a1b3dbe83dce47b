//! Routes for the navigation bounded context.
//!
//! Track payloads and navigation context are carried as raw JSON; the
//! engine never looks inside them.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gridwalk_core::position::Position;
use gridwalk_core::repository::StoredEvent;
use gridwalk_core::track::{OwnerId, TrackId, TrackMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use gridwalk_navigation::application::query_handlers::{self, NavigationView};
use gridwalk_navigation::application::command_handlers;
use gridwalk_navigation::domain::commands;
use gridwalk_navigation::domain::linear::{LinearStep, build_linear_tracks};
use gridwalk_navigation::domain::registry::RegistrationConflict;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Identifier to use; a fresh one is generated when absent.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The base track map.
    pub base_tracks: TrackMap<Value>,
    /// Track the journey starts on; must sit at the origin.
    pub initial_track_id: TrackId,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    /// The new session's identifier.
    pub session_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Request body for POST /{session_id}/navigate.
#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    /// The target track.
    pub track_id: TrackId,
    /// Context to store for the target.
    #[serde(default)]
    pub context: Option<Value>,
}

/// Request body for POST /{session_id}/tracks.
#[derive(Debug, Deserialize)]
pub struct RegisterTracksRequest {
    /// The registering owner.
    pub owner_id: OwnerId,
    /// Tracks relative to the anchor.
    pub tracks: TrackMap<Value>,
    /// Anchor; defaults to the current position.
    #[serde(default)]
    pub anchor: Option<Position>,
}

/// Query string for DELETE /{session_id}/tracks.
#[derive(Debug, Deserialize)]
pub struct DeregisterTracksQuery {
    /// Owner to remove; every overlay goes when absent.
    pub owner_id: Option<OwnerId>,
}

/// Request body for POST /linear-tracks.
#[derive(Debug, Deserialize)]
pub struct LinearTracksRequest {
    /// Steps in flow order.
    pub steps: Vec<LinearStep<Value>>,
}

/// Response body for POST /linear-tracks.
#[derive(Debug, Serialize)]
pub struct LinearTracksResponse {
    /// The built track map, first step at the origin.
    pub tracks: TrackMap<Value>,
}

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the domain events produced and persisted. Empty for a no-op.
    pub event_ids: Vec<Uuid>,
}

/// Response body for POST /{session_id}/tracks.
#[derive(Debug, Serialize)]
pub struct RegisterTracksResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// This owner's entries that the merge rejected.
    pub conflicts: Vec<RegistrationConflict>,
}

fn event_ids(stored_events: &[StoredEvent]) -> Vec<Uuid> {
    stored_events.iter().map(|e| e.event_id).collect()
}

/// POST /
#[instrument(skip(state, request), fields(initial_track_id = %request.initial_track_id))]
async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    let command = commands::StartSession {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id.unwrap_or_else(Uuid::new_v4),
        base_tracks: request.base_tracks,
        initial_track_id: request.initial_track_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        session_id = %command.session_id,
        "handling start_session command"
    );

    let result = command_handlers::handle_start_session::<Value, Value>(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id: result.aggregate_id,
            event_ids: event_ids(&result.stored_events),
        }),
    ))
}

/// GET /{session_id}
#[instrument(skip(state), fields(session_id = %session_id))]
async fn get_navigation(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<NavigationView<Value, Value>>, ApiError> {
    let view = query_handlers::get_navigation_by_id(session_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// POST /{session_id}/navigate
#[instrument(skip(state, request), fields(session_id = %session_id, track_id = %request.track_id))]
async fn navigate(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<NavigateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::NavigateToTrack {
        correlation_id: Uuid::new_v4(),
        session_id,
        track_id: request.track_id,
        context: request.context,
    };

    info!(correlation_id = %command.correlation_id, "handling navigate_to_track command");

    let result = command_handlers::handle_navigate_to_track::<Value, Value>(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: event_ids(&result.stored_events),
    }))
}

/// POST /{session_id}/return
#[instrument(skip(state), fields(session_id = %session_id))]
async fn return_to_last(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ReturnToLast {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(correlation_id = %command.correlation_id, "handling return_to_last command");

    let result = command_handlers::handle_return_to_last::<Value, Value>(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: event_ids(&result.stored_events),
    }))
}

/// POST /{session_id}/tracks
#[instrument(skip(state, request), fields(session_id = %session_id, owner_id = %request.owner_id))]
async fn register_tracks(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RegisterTracksRequest>,
) -> Result<Json<RegisterTracksResponse>, ApiError> {
    let command = commands::RegisterTracks {
        correlation_id: Uuid::new_v4(),
        session_id,
        owner_id: request.owner_id,
        tracks: request.tracks,
        anchor: request.anchor,
    };

    info!(correlation_id = %command.correlation_id, "handling register_tracks command");

    let result = command_handlers::handle_register_tracks::<Value, Value>(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(RegisterTracksResponse {
        event_ids: event_ids(&result.stored_events),
        conflicts: result.conflicts,
    }))
}

/// DELETE /{session_id}/tracks
#[instrument(skip(state, query), fields(session_id = %session_id, owner_id = ?query.owner_id))]
async fn deregister_tracks(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<DeregisterTracksQuery>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeregisterTracks {
        correlation_id: Uuid::new_v4(),
        session_id,
        owner_id: query.owner_id,
    };

    info!(correlation_id = %command.correlation_id, "handling deregister_tracks command");

    let result = command_handlers::handle_deregister_tracks::<Value, Value>(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse {
        event_ids: event_ids(&result.stored_events),
    }))
}

/// POST /linear-tracks
#[instrument(skip(request), fields(steps = request.steps.len()))]
async fn linear_tracks(Json(request): Json<LinearTracksRequest>) -> Json<LinearTracksResponse> {
    Json(LinearTracksResponse {
        tracks: build_linear_tracks(request.steps),
    })
}

/// Returns the router for the navigation context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_session))
        .route("/linear-tracks", post(linear_tracks))
        .route("/{session_id}", get(get_navigation))
        .route("/{session_id}/navigate", post(navigate))
        .route("/{session_id}/return", post(return_to_last))
        .route(
            "/{session_id}/tracks",
            post(register_tracks).delete(deregister_tracks),
        )
}
