//! Merging the base track map with overlays into one flattened registry.
//!
//! The merge is first-come-first-served: base tracks always win, and among
//! overlays the owner registered earlier wins. A rejected overlay entry is
//! dropped on its own; the rest of the merge carries on.

use gridwalk_core::position::Position;
use gridwalk_core::track::{TrackEntry, TrackId, TrackMap};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// An overlay entry that was left out of the flattened registry.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RegistrationConflict {
    /// The id is already taken by a base track or an earlier overlay.
    #[error("duplicate track id {track_id} registered by {owner_id}")]
    DuplicateId {
        /// Owner of the rejected overlay.
        owner_id: String,
        /// The id that was already taken.
        track_id: TrackId,
    },

    /// Another track already occupies the cell.
    #[error("track {track_id} registered by {owner_id} conflicts with {occupant} at {position}")]
    PositionConflict {
        /// Owner of the rejected overlay.
        owner_id: String,
        /// The rejected track.
        track_id: TrackId,
        /// The contested cell.
        position: Position,
        /// The track already placed there.
        occupant: TrackId,
    },
}

impl RegistrationConflict {
    /// Owner whose entry was rejected.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        match self {
            Self::DuplicateId { owner_id, .. } | Self::PositionConflict { owner_id, .. } => {
                owner_id
            }
        }
    }

    /// Id of the rejected entry.
    #[must_use]
    pub fn track_id(&self) -> &str {
        match self {
            Self::DuplicateId { track_id, .. } | Self::PositionConflict { track_id, .. } => {
                track_id
            }
        }
    }
}

/// The merged, conflict-free list of tracks plus what was rejected on the
/// way there.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedRegistry<P> {
    tracks: Vec<TrackEntry<P>>,
    conflicts: Vec<RegistrationConflict>,
}

impl<P> FlattenedRegistry<P> {
    /// Tracks in merge order: base tracks first, then overlays in
    /// registration order.
    #[must_use]
    pub fn tracks(&self) -> &[TrackEntry<P>] {
        &self.tracks
    }

    /// Entries rejected by the merge that produced this registry.
    #[must_use]
    pub fn conflicts(&self) -> &[RegistrationConflict] {
        &self.conflicts
    }

    /// Looks up a track by id.
    #[must_use]
    pub fn get(&self, track_id: &str) -> Option<&TrackEntry<P>> {
        self.tracks.iter().find(|entry| entry.id == track_id)
    }

    /// Returns the track occupying `position`, if any.
    #[must_use]
    pub fn at(&self, position: Position) -> Option<&TrackEntry<P>> {
        self.tracks.iter().find(|entry| entry.position == position)
    }

    /// Number of tracks in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns `true` if the registry holds no tracks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Merges `base` with `overlays`, visited in the order given.
///
/// Each candidate is checked against the accumulated result: an id that is
/// already present, or a cell that is already occupied, rejects the
/// candidate. The position scan is linear in the result size; track counts
/// are expected to stay in the tens.
pub fn flatten<'a, P, I>(base: &TrackMap<P>, overlays: I) -> FlattenedRegistry<P>
where
    P: Clone + 'a,
    I: IntoIterator<Item = (&'a str, &'a TrackMap<P>)>,
{
    let mut merged = base.clone();
    let mut conflicts = Vec::new();

    for (owner_id, overlay) in overlays {
        for (track_id, definition) in overlay {
            if merged.contains_key(track_id) {
                warn!(owner_id, track_id = %track_id, "duplicate track id, entry dropped");
                conflicts.push(RegistrationConflict::DuplicateId {
                    owner_id: owner_id.to_owned(),
                    track_id: track_id.clone(),
                });
                continue;
            }

            let occupant = merged
                .iter()
                .find(|(_, existing)| existing.position == definition.position)
                .map(|(id, _)| id.clone());
            if let Some(occupant) = occupant {
                warn!(
                    owner_id,
                    track_id = %track_id,
                    position = %definition.position,
                    occupant = %occupant,
                    "position conflict, entry dropped"
                );
                conflicts.push(RegistrationConflict::PositionConflict {
                    owner_id: owner_id.to_owned(),
                    track_id: track_id.clone(),
                    position: definition.position,
                    occupant,
                });
                continue;
            }

            merged.insert(track_id.clone(), definition.clone());
        }
    }

    let tracks = merged
        .into_iter()
        .map(|(id, definition)| TrackEntry {
            id,
            position: definition.position,
            payload: definition.payload,
        })
        .collect();

    FlattenedRegistry { tracks, conflicts }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use gridwalk_core::track::TrackDefinition;
    use proptest::prelude::*;

    fn map(entries: &[(&str, (i64, i64))]) -> TrackMap<&'static str> {
        entries
            .iter()
            .map(|(id, position)| ((*id).to_owned(), TrackDefinition::new(*position, "payload")))
            .collect()
    }

    fn ids<P>(registry: &FlattenedRegistry<P>) -> Vec<&str> {
        registry.tracks().iter().map(|entry| entry.id.as_str()).collect()
    }

    #[test]
    fn test_flatten_without_overlays_returns_base_in_order() {
        // Arrange
        let base = map(&[("start", (0, 0)), ("left", (-1, 0)), ("right", (1, 0))]);

        // Act
        let registry = flatten(&base, std::iter::empty());

        // Assert
        assert_eq!(ids(&registry), vec!["start", "left", "right"]);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn test_flatten_appends_overlay_tracks_after_base() {
        let base = map(&[("start", (0, 0))]);
        let overlay = map(&[("below", (0, 1))]);

        let registry = flatten(&base, [("app", &overlay)]);

        assert_eq!(ids(&registry), vec!["start", "below"]);
        assert_eq!(registry.get("below").unwrap().position, Position::new(0, 1));
    }

    #[test]
    fn test_flatten_rejects_duplicate_id_and_keeps_base_entry() {
        // Arrange
        let base = map(&[("start", (0, 0))]);
        let overlay = map(&[("start", (5, 5)), ("other", (1, 0))]);

        // Act
        let registry = flatten(&base, [("app", &overlay)]);

        // Assert
        assert_eq!(ids(&registry), vec!["start", "other"]);
        assert_eq!(registry.get("start").unwrap().position, Position::ORIGIN);
        assert_eq!(
            registry.conflicts(),
            &[RegistrationConflict::DuplicateId {
                owner_id: "app".to_owned(),
                track_id: "start".to_owned(),
            }]
        );
    }

    #[test]
    fn test_flatten_rejects_position_conflict_with_base() {
        let base = map(&[("start", (0, 0)), ("below", (0, 1))]);
        let overlay = map(&[("x", (0, 1))]);

        let registry = flatten(&base, [("app", &overlay)]);

        assert!(registry.get("x").is_none());
        assert_eq!(
            registry.conflicts(),
            &[RegistrationConflict::PositionConflict {
                owner_id: "app".to_owned(),
                track_id: "x".to_owned(),
                position: Position::new(0, 1),
                occupant: "below".to_owned(),
            }]
        );
    }

    #[test]
    fn test_flatten_earlier_overlay_wins_against_later_one() {
        // Arrange
        let base = map(&[("start", (0, 0))]);
        let first = map(&[("a", (2, 0))]);
        let second = map(&[("b", (2, 0)), ("c", (3, 0))]);

        // Act
        let registry = flatten(&base, [("first", &first), ("second", &second)]);

        // Assert
        assert_eq!(ids(&registry), vec!["start", "a", "c"]);
        assert_eq!(registry.conflicts().len(), 1);
        assert_eq!(registry.conflicts()[0].owner_id(), "second");
        assert_eq!(registry.conflicts()[0].track_id(), "b");
    }

    #[test]
    fn test_at_finds_track_by_position() {
        let base = map(&[("start", (0, 0)), ("left", (-1, 0))]);

        let registry = flatten(&base, std::iter::empty());

        assert_eq!(registry.at(Position::new(-1, 0)).unwrap().id, "left");
        assert!(registry.at(Position::new(9, 9)).is_none());
    }

    #[test]
    fn test_conflict_messages_name_owner_and_track() {
        let conflict = RegistrationConflict::PositionConflict {
            owner_id: "app".to_owned(),
            track_id: "x".to_owned(),
            position: Position::new(0, 1),
            occupant: "below".to_owned(),
        };

        assert_eq!(
            conflict.to_string(),
            "track x registered by app conflicts with below at (0, 1)"
        );
    }

    fn overlay_strategy() -> impl Strategy<Value = Vec<(String, (i64, i64))>> {
        prop::collection::vec(("[a-f]", (-3i64..3, -3i64..3)), 0..8)
    }

    proptest! {
        #[test]
        fn flatten_never_yields_duplicate_ids_or_positions(
            overlays in prop::collection::vec(overlay_strategy(), 0..5)
        ) {
            let base = map(&[("start", (0, 0)), ("left", (-1, 0))]);
            let overlay_maps: Vec<(String, TrackMap<&'static str>)> = overlays
                .iter()
                .enumerate()
                .map(|(index, entries)| {
                    let tracks = entries
                        .iter()
                        .map(|(id, position)| (id.clone(), TrackDefinition::new(*position, "payload")))
                        .collect();
                    (format!("owner-{index}"), tracks)
                })
                .collect();

            let registry = flatten(
                &base,
                overlay_maps.iter().map(|(owner, tracks)| (owner.as_str(), tracks)),
            );

            let unique_ids: HashSet<&str> = registry.tracks().iter().map(|t| t.id.as_str()).collect();
            let unique_positions: HashSet<Position> = registry.tracks().iter().map(|t| t.position).collect();
            prop_assert_eq!(unique_ids.len(), registry.len());
            prop_assert_eq!(unique_positions.len(), registry.len());
            prop_assert_eq!(registry.get("start").map(|t| t.position), Some(Position::ORIGIN));
        }
    }
}
