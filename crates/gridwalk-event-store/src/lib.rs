//! Event store implementations for the gridwalk navigation engine.

pub mod in_memory_event_repository;
