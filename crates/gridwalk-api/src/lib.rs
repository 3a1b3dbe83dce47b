//! Gridwalk — HTTP host for navigation sessions.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
