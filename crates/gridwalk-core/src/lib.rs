//! Gridwalk Core — shared value types and abstractions.
//!
//! This crate defines the grid coordinate and track types, the error taxonomy and the
//! event-sourcing traits that the navigation context and its hosts depend
//! on. It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod position;
pub mod repository;
pub mod track;
