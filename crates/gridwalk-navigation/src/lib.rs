//! Gridwalk — coordinate-addressed navigation.
//!
//! Tracks (named views) sit on an unbounded integer grid. A base track map
//! is merged with owner-scoped overlays into a conflict-free registry, and a
//! navigation state machine walks that registry while keeping a visit
//! history and per-track context.
//!
//! [`domain::state::NavigationState`] is the synchronous engine. The
//! event-sourced [`domain::aggregates::NavigationSession`] wraps it for
//! hosts that persist sessions through an event repository.

pub mod application;
pub mod domain;
