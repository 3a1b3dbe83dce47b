//! Tracks: named cells on the grid and the maps they are grouped in.

use crate::position::Position;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of a track, unique within the merged registry.
pub type TrackId = String;

/// Identifier of the caller that registered an overlay.
pub type OwnerId = String;

/// A track as declared by its owner: where it sits and what to render.
///
/// The payload is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDefinition<P> {
    /// Grid cell the track occupies.
    pub position: Position,
    /// Opaque render payload.
    pub payload: P,
}

impl<P> TrackDefinition<P> {
    /// Creates a definition at `position`.
    pub fn new(position: impl Into<Position>, payload: P) -> Self {
        Self {
            position: position.into(),
            payload,
        }
    }
}

/// Tracks keyed by id. Iteration follows insertion order.
pub type TrackMap<P> = IndexMap<TrackId, TrackDefinition<P>>;

/// One entry of the flattened registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry<P> {
    /// Track identifier.
    pub id: TrackId,
    /// Grid cell the track occupies.
    pub position: Position,
    /// Opaque render payload.
    pub payload: P,
}

/// Shifts every position in `tracks` by `anchor`; payloads pass through.
#[must_use]
pub fn translate_tracks<P>(tracks: TrackMap<P>, anchor: Position) -> TrackMap<P> {
    tracks
        .into_iter()
        .map(|(id, definition)| {
            let position = definition.position.offset_by(anchor);
            (id, TrackDefinition { position, ..definition })
        })
        .collect()
}
