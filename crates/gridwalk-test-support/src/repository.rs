//! Fake `EventRepository` implementations.

use std::sync::Mutex;

use async_trait::async_trait;
use gridwalk_core::error::DomainError;
use gridwalk_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

/// A repository that serves a fixed stream from `load_events` and records
/// every `append_events` call without persisting it.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    stream: Vec<StoredEvent>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Serves `stream` for every aggregate id.
    #[must_use]
    pub fn with_stream(stream: Vec<StoredEvent>) -> Self {
        Self {
            stream,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Every `(aggregate_id, expected_version, events)` appended so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// A repository with no streams that silently accepts appends.
#[derive(Debug, Clone, Copy)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(Vec::new())
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A repository whose every call fails with an infrastructure error.
#[derive(Debug, Clone, Copy)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("event store unavailable".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("event store unavailable".into()))
    }
}
