//! Domain model for the navigation context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod linear;
pub mod overlays;
pub mod registry;
pub mod state;
