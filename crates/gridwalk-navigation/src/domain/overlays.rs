//! Owner-scoped overlays registered on top of the base track map.

use gridwalk_core::position::Position;
use gridwalk_core::track::{OwnerId, TrackMap, translate_tracks};
use indexmap::IndexMap;

/// Overlays keyed by owner, kept in registration order.
///
/// Overlays are stored already translated by their anchor. Re-registering
/// an owner replaces its tracks but keeps the owner's original slot in the
/// order, which decides who wins a conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayManager<P> {
    overlays: IndexMap<OwnerId, TrackMap<P>>,
}

impl<P> Default for OverlayManager<P> {
    fn default() -> Self {
        Self {
            overlays: IndexMap::new(),
        }
    }
}

impl<P> OverlayManager<P> {
    /// Creates an empty overlay collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the anchor for a registration: the explicit one if given,
    /// otherwise the current position.
    #[must_use]
    pub fn resolve_anchor(anchor: Option<Position>, current_position: Position) -> Position {
        anchor.unwrap_or(current_position)
    }

    /// Translates `tracks` by `anchor` and stores them under `owner_id`,
    /// returning the overlay previously registered by that owner.
    pub fn register(
        &mut self,
        owner_id: impl Into<OwnerId>,
        tracks: TrackMap<P>,
        anchor: Position,
    ) -> Option<TrackMap<P>> {
        self.insert_translated(owner_id.into(), translate_tracks(tracks, anchor))
    }

    /// Stores tracks that are already translated.
    pub fn insert_translated(
        &mut self,
        owner_id: OwnerId,
        translated: TrackMap<P>,
    ) -> Option<TrackMap<P>> {
        self.overlays.insert(owner_id, translated)
    }

    /// Removes one owner's overlay, keeping the order of the rest.
    pub fn remove(&mut self, owner_id: &str) -> Option<TrackMap<P>> {
        self.overlays.shift_remove(owner_id)
    }

    /// Removes every overlay.
    pub fn clear(&mut self) {
        self.overlays.clear();
    }

    /// Returns the overlay registered by `owner_id`.
    #[must_use]
    pub fn get(&self, owner_id: &str) -> Option<&TrackMap<P>> {
        self.overlays.get(owner_id)
    }

    /// Iterates overlays in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TrackMap<P>)> {
        self.overlays
            .iter()
            .map(|(owner_id, tracks)| (owner_id.as_str(), tracks))
    }

    /// Number of registered owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns `true` when no overlay is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}
