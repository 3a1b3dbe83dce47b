//! Building a track map from an ordered list of steps.

use gridwalk_core::position::Position;
use gridwalk_core::track::{TrackDefinition, TrackId, TrackMap};
use serde::{Deserialize, Serialize};

/// Direction of one step relative to the previous one.
///
/// There is no upward step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDirection {
    /// One cell to the left.
    Left,
    /// One cell to the right.
    #[default]
    Right,
    /// One cell down.
    Down,
}

impl StepDirection {
    /// Unit offset of this direction.
    #[must_use]
    pub const fn delta(self) -> Position {
        match self {
            Self::Left => Position::new(-1, 0),
            Self::Right => Position::new(1, 0),
            Self::Down => Position::new(0, 1),
        }
    }
}

/// One entry of a linear flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearStep<P> {
    /// Track id for this step.
    pub id: TrackId,
    /// Where this step sits relative to the previous one; defaults to right.
    #[serde(default)]
    pub direction: Option<StepDirection>,
    /// Opaque render payload.
    pub payload: P,
}

/// Accumulates steps into a [`TrackMap`].
///
/// The first step always lands on the origin, whatever direction it
/// declares. A later step with an id already used replaces the earlier
/// definition, but the walk still advances by its direction.
#[derive(Debug, Clone)]
pub struct LinearTrackBuilder<P> {
    tracks: TrackMap<P>,
    cursor: Option<Position>,
}

impl<P> Default for LinearTrackBuilder<P> {
    fn default() -> Self {
        Self {
            tracks: TrackMap::new(),
            cursor: None,
        }
    }
}

impl<P> LinearTrackBuilder<P> {
    /// Starts an empty flow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step to the right of the previous one.
    #[must_use]
    pub fn step(self, id: impl Into<TrackId>, payload: P) -> Self {
        self.push(LinearStep {
            id: id.into(),
            direction: None,
            payload,
        })
    }

    /// Appends a step in `direction` from the previous one.
    #[must_use]
    pub fn step_toward(self, id: impl Into<TrackId>, direction: StepDirection, payload: P) -> Self {
        self.push(LinearStep {
            id: id.into(),
            direction: Some(direction),
            payload,
        })
    }

    /// Appends an already assembled step.
    #[must_use]
    pub fn push(mut self, step: LinearStep<P>) -> Self {
        let position = match self.cursor {
            None => Position::ORIGIN,
            Some(previous) => previous.offset_by(step.direction.unwrap_or_default().delta()),
        };
        self.cursor = Some(position);
        self.tracks
            .insert(step.id, TrackDefinition::new(position, step.payload));
        self
    }

    /// Finishes the flow.
    #[must_use]
    pub fn build(self) -> TrackMap<P> {
        self.tracks
    }
}

/// Builds a track map from `steps` in order.
pub fn build_linear_tracks<P>(steps: impl IntoIterator<Item = LinearStep<P>>) -> TrackMap<P> {
    steps
        .into_iter()
        .fold(LinearTrackBuilder::new(), LinearTrackBuilder::push)
        .build()
}
