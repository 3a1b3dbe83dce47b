//! Track maps used across the test suites.
//!
//! Payloads are the track ids themselves, which keeps assertions on
//! pass-through payloads short.

use gridwalk_core::track::{TrackDefinition, TrackMap};

/// Builds a track map from `(id, (x, y))` pairs, in order.
#[must_use]
pub fn tracks_at(entries: &[(&'static str, (i64, i64))]) -> TrackMap<&'static str> {
    entries
        .iter()
        .map(|&(id, position)| (id.to_owned(), TrackDefinition::new(position, id)))
        .collect()
}

/// `start` at the origin with `left` and `right` beside it.
#[must_use]
pub fn cross_tracks() -> TrackMap<&'static str> {
    tracks_at(&[("start", (0, 0)), ("left", (-1, 0)), ("right", (1, 0))])
}

/// Converts fixture payloads to owned strings, for code paths that need to
/// deserialize them back.
#[must_use]
pub fn owned(tracks: TrackMap<&'static str>) -> TrackMap<String> {
    tracks
        .into_iter()
        .map(|(id, track)| (id, TrackDefinition::new(track.position, track.payload.to_owned())))
        .collect()
}
