//! The navigation state machine.
//!
//! State is split into slices (base map, overlays, flattened registry,
//! journey stack, context store) that each live behind an `Arc`. A mutation
//! builds replacement slices and swaps them in, so a [`NavigationSnapshot`]
//! taken earlier keeps seeing the pre-mutation state in full.

use std::cmp::Ordering;
use std::sync::Arc;

use gridwalk_core::error::NavigationError;
use gridwalk_core::position::Position;
use gridwalk_core::track::{OwnerId, TrackEntry, TrackId, TrackMap, translate_tracks};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::overlays::OverlayManager;
use super::registry::{FlattenedRegistry, RegistrationConflict, flatten};

/// Context recorded per track at navigation time. `None` marks a navigation
/// that carried no context.
pub type ContextStore<C> = IndexMap<TrackId, Option<C>>;

/// Coarse direction of the transition that `return_to_last` would undo.
///
/// Only the horizontal delta is inspected: every transition without a
/// horizontal component, whether it went up, down or nowhere, reads as
/// `Top`. It is not a general direction vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnDirection {
    /// The previous track is to the left of the current position.
    Left,
    /// The previous track is to the right of the current position.
    Right,
    /// The previous track is in the same column.
    Top,
}

/// An immutable view of the whole navigation state at one instant.
#[derive(Debug)]
pub struct NavigationSnapshot<P, C> {
    registry: Arc<FlattenedRegistry<P>>,
    journey: Arc<Vec<TrackId>>,
    context: Arc<ContextStore<C>>,
    current_position: Position,
}

impl<P, C> Clone for NavigationSnapshot<P, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            journey: Arc::clone(&self.journey),
            context: Arc::clone(&self.context),
            current_position: self.current_position,
        }
    }
}

impl<P, C> NavigationSnapshot<P, C> {
    /// Visit history, oldest first. Never empty.
    #[must_use]
    pub fn journey_stack(&self) -> &[TrackId] {
        &self.journey
    }

    /// Position set by the last navigation or return.
    #[must_use]
    pub fn current_position(&self) -> Position {
        self.current_position
    }

    /// The track occupying the current position, if one still does.
    #[must_use]
    pub fn current_track(&self) -> Option<&TrackEntry<P>> {
        self.registry.at(self.current_position)
    }

    /// Every track in the flattened registry.
    #[must_use]
    pub fn all_tracks(&self) -> &[TrackEntry<P>] {
        self.registry.tracks()
    }

    /// Context stored per track.
    #[must_use]
    pub fn context_map(&self) -> &ContextStore<C> {
        &self.context
    }

    /// Entries rejected by the last merge.
    #[must_use]
    pub fn conflicts(&self) -> &[RegistrationConflict] {
        self.registry.conflicts()
    }

    /// `true` iff the track at the current position has `track_id`.
    #[must_use]
    pub fn is_current_track(&self, track_id: &str) -> bool {
        self.current_track().is_some_and(|track| track.id == track_id)
    }

    /// The journey entry just below the top, i.e. where a return would go.
    #[must_use]
    pub fn previous_track_id(&self) -> Option<&str> {
        let len = self.journey.len();
        if len < 2 {
            return None;
        }
        self.journey.get(len - 2).map(String::as_str)
    }

    /// Direction of the previous track relative to the current position.
    ///
    /// `None` when there is no previous entry, or when either the previous
    /// track or the current track cannot be resolved.
    #[must_use]
    pub fn return_direction(&self) -> Option<ReturnDirection> {
        let previous = self.registry.get(self.previous_track_id()?)?;
        self.current_track()?;

        Some(match previous.position.x.cmp(&self.current_position.x) {
            Ordering::Less => ReturnDirection::Left,
            Ordering::Greater => ReturnDirection::Right,
            Ordering::Equal => ReturnDirection::Top,
        })
    }

    /// Looks up a track by id in the flattened registry.
    #[must_use]
    pub fn track(&self, track_id: &str) -> Option<&TrackEntry<P>> {
        self.registry.get(track_id)
    }
}

/// One independent navigation engine.
///
/// `P` is the opaque track payload and `C` the opaque navigation context;
/// neither is ever inspected.
#[derive(Debug)]
pub struct NavigationState<P, C> {
    base: Arc<TrackMap<P>>,
    overlays: Arc<OverlayManager<P>>,
    snapshot: NavigationSnapshot<P, C>,
}

impl<P, C> Clone for NavigationState<P, C> {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            overlays: Arc::clone(&self.overlays),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<P: Clone, C: Clone> NavigationState<P, C> {
    /// Creates an engine positioned on `initial_track_id`.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InitialTrackMissing` if the id is not in
    /// `base`, `NavigationError::InitialTrackNotAtOrigin` if it is not
    /// placed at (0, 0), and `NavigationError::OverlappingBaseTracks` if two
    /// base tracks share a cell.
    pub fn new(
        base: TrackMap<P>,
        initial_track_id: impl Into<TrackId>,
    ) -> Result<Self, NavigationError> {
        let initial_track_id = initial_track_id.into();

        let Some(initial) = base.get(&initial_track_id) else {
            return Err(NavigationError::InitialTrackMissing {
                track_id: initial_track_id,
            });
        };
        if !initial.position.is_origin() {
            return Err(NavigationError::InitialTrackNotAtOrigin {
                track_id: initial_track_id,
                position: initial.position,
            });
        }
        for (index, (track_id, definition)) in base.iter().enumerate() {
            let occupant = base
                .iter()
                .take(index)
                .find(|(_, earlier)| earlier.position == definition.position);
            if let Some((occupant, _)) = occupant {
                return Err(NavigationError::OverlappingBaseTracks {
                    track_id: track_id.clone(),
                    occupant: occupant.clone(),
                    position: definition.position,
                });
            }
        }

        let overlays = OverlayManager::new();
        let registry = flatten(&base, overlays.iter());

        Ok(Self {
            base: Arc::new(base),
            overlays: Arc::new(overlays),
            snapshot: NavigationSnapshot {
                registry: Arc::new(registry),
                journey: Arc::new(vec![initial_track_id]),
                context: Arc::new(ContextStore::new()),
                current_position: Position::ORIGIN,
            },
        })
    }

    /// Moves to `track_id`, records it in the journey and stores `context`
    /// for it, overwriting any earlier context.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if the id is not in
    /// the flattened registry. Nothing changes in that case.
    pub fn navigate_to_track(
        &mut self,
        track_id: &str,
        context: Option<C>,
    ) -> Result<(), NavigationError> {
        let position = self.resolve(track_id)?;
        self.enter(track_id.to_owned(), position, context);
        Ok(())
    }

    /// Steps back to the previous journey entry.
    ///
    /// A journey holding only its initial entry makes this a no-op. Context
    /// stored for the track being left is kept.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if the previous entry
    /// no longer resolves (its overlay was removed). Nothing changes then.
    pub fn return_to_last(&mut self) -> Result<(), NavigationError> {
        if let Some((_, position)) = self.return_target()? {
            self.retreat(position);
        }
        Ok(())
    }

    /// Registers `tracks` for `owner_id`, translated by `anchor` or, when no
    /// anchor is given, by the current position.
    ///
    /// Any overlay previously registered by the owner is replaced. Returns
    /// the owner's entries that the merge rejected.
    pub fn register_new_tracks(
        &mut self,
        owner_id: impl Into<OwnerId>,
        tracks: TrackMap<P>,
        anchor: Option<Position>,
    ) -> Vec<RegistrationConflict> {
        let owner_id = owner_id.into();
        let anchor = self.resolve_anchor(anchor);
        self.install_overlay(owner_id.clone(), translate_tracks(tracks, anchor));
        self.conflicts_for(&owner_id)
    }

    /// Removes overlays.
    ///
    /// With an owner, removes that owner's overlay and purges stored context
    /// for every id the overlay declared. Without one, removes all overlays
    /// and leaves stored context untouched. Returns `false` when there was
    /// nothing to remove.
    pub fn deregister_tracks(&mut self, owner_id: Option<&str>) -> bool {
        match owner_id {
            Some(owner_id) => self.remove_overlay(owner_id),
            None => self.clear_overlays(),
        }
    }

    /// Resolves `track_id` against the flattened registry.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if it is absent.
    pub fn resolve(&self, track_id: &str) -> Result<Position, NavigationError> {
        match self.snapshot.track(track_id) {
            Some(track) => Ok(track.position),
            None => {
                warn!(track_id, "invalid track reference");
                Err(NavigationError::InvalidTrackReference {
                    track_id: track_id.to_owned(),
                })
            }
        }
    }

    /// The anchor a registration would use.
    #[must_use]
    pub fn resolve_anchor(&self, anchor: Option<Position>) -> Position {
        OverlayManager::<P>::resolve_anchor(anchor, self.snapshot.current_position)
    }

    /// Where `return_to_last` would go, or `None` when there is no previous
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::InvalidTrackReference` if the previous entry
    /// does not resolve.
    pub fn return_target(&self) -> Result<Option<(TrackId, Position)>, NavigationError> {
        let Some(previous) = self.snapshot.previous_track_id() else {
            debug!("journey has a single entry, nothing to return to");
            return Ok(None);
        };
        let position = self.resolve(previous)?;
        Ok(Some((previous.to_owned(), position)))
    }

    /// Pushes `track_id` onto the journey and moves to `position`.
    pub(crate) fn enter(&mut self, track_id: TrackId, position: Position, context: Option<C>) {
        let mut context_store = (*self.snapshot.context).clone();
        context_store.insert(track_id.clone(), context);

        let mut journey = (*self.snapshot.journey).clone();
        journey.push(track_id);

        self.snapshot = NavigationSnapshot {
            registry: Arc::clone(&self.snapshot.registry),
            journey: Arc::new(journey),
            context: Arc::new(context_store),
            current_position: position,
        };
    }

    /// Pops the top journey entry and moves to `position`.
    pub(crate) fn retreat(&mut self, position: Position) {
        let mut journey = (*self.snapshot.journey).clone();
        if journey.len() > 1 {
            journey.pop();
        }

        self.snapshot = NavigationSnapshot {
            journey: Arc::new(journey),
            current_position: position,
            ..self.snapshot.clone()
        };
    }

    /// Stores an already translated overlay and re-merges.
    pub(crate) fn install_overlay(&mut self, owner_id: OwnerId, translated: TrackMap<P>) {
        let mut overlays = (*self.overlays).clone();
        overlays.insert_translated(owner_id, translated);
        self.replace_overlays(overlays);
    }

    /// Removes one owner's overlay and its context entries.
    pub(crate) fn remove_overlay(&mut self, owner_id: &str) -> bool {
        let mut overlays = (*self.overlays).clone();
        let Some(removed) = overlays.remove(owner_id) else {
            debug!(owner_id, "no overlay registered for owner");
            return false;
        };

        let mut context_store = (*self.snapshot.context).clone();
        for track_id in removed.keys() {
            context_store.shift_remove(track_id);
        }

        self.snapshot = NavigationSnapshot {
            context: Arc::new(context_store),
            ..self.snapshot.clone()
        };
        self.replace_overlays(overlays);
        true
    }

    /// Removes every overlay. Stored context survives.
    pub(crate) fn clear_overlays(&mut self) -> bool {
        if self.overlays.is_empty() {
            debug!("no overlays registered");
            return false;
        }
        self.replace_overlays(OverlayManager::new());
        true
    }

    fn replace_overlays(&mut self, overlays: OverlayManager<P>) {
        let registry = flatten(&self.base, overlays.iter());
        self.overlays = Arc::new(overlays);
        self.snapshot = NavigationSnapshot {
            registry: Arc::new(registry),
            ..self.snapshot.clone()
        };
    }
}

impl<P, C> NavigationState<P, C> {
    /// A cheap, immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> NavigationSnapshot<P, C> {
        self.snapshot.clone()
    }

    /// The base track map the engine was built with.
    #[must_use]
    pub fn base_tracks(&self) -> &TrackMap<P> {
        &self.base
    }

    /// Registered overlays, already translated.
    #[must_use]
    pub fn overlays(&self) -> &OverlayManager<P> {
        &self.overlays
    }

    /// Visit history, oldest first.
    #[must_use]
    pub fn journey_stack(&self) -> &[TrackId] {
        self.snapshot.journey_stack()
    }

    /// Position set by the last navigation or return.
    #[must_use]
    pub fn current_position(&self) -> Position {
        self.snapshot.current_position
    }

    /// The track at the current position, if any.
    #[must_use]
    pub fn current_track(&self) -> Option<&TrackEntry<P>> {
        self.snapshot.current_track()
    }

    /// The flattened registry.
    #[must_use]
    pub fn all_tracks(&self) -> &[TrackEntry<P>] {
        self.snapshot.all_tracks()
    }

    /// Context stored per track.
    #[must_use]
    pub fn context_map(&self) -> &ContextStore<C> {
        self.snapshot.context_map()
    }

    /// Context stored for one track. The outer `None` means nothing was
    /// stored; `Some(None)` means the track was visited without context.
    #[must_use]
    pub fn context(&self, track_id: &str) -> Option<&Option<C>> {
        self.snapshot.context.get(track_id)
    }

    /// Entries rejected by the last merge.
    #[must_use]
    pub fn conflicts(&self) -> &[RegistrationConflict] {
        self.snapshot.conflicts()
    }

    /// Rejected entries belonging to `owner_id`.
    #[must_use]
    pub fn conflicts_for(&self, owner_id: &str) -> Vec<RegistrationConflict> {
        self.conflicts()
            .iter()
            .filter(|conflict| conflict.owner_id() == owner_id)
            .cloned()
            .collect()
    }

    /// `true` iff the track at the current position has `track_id`.
    #[must_use]
    pub fn is_current_track(&self, track_id: &str) -> bool {
        self.snapshot.is_current_track(track_id)
    }

    /// See [`NavigationSnapshot::return_direction`].
    #[must_use]
    pub fn return_direction(&self) -> Option<ReturnDirection> {
        self.snapshot.return_direction()
    }

    /// Looks up a track in the flattened registry.
    #[must_use]
    pub fn track(&self, track_id: &str) -> Option<&TrackEntry<P>> {
        self.snapshot.track(track_id)
    }

    /// `true` when the journey has an entry to return to.
    #[must_use]
    pub fn can_return(&self) -> bool {
        self.snapshot.previous_track_id().is_some()
    }
}
