//! In-memory implementation of the `EventRepository` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use gridwalk_core::error::DomainError;
use gridwalk_core::repository::{EventRepository, StoredEvent};

/// Event repository holding every stream in process memory.
///
/// Appends are checked against the stream length, so two writers that
/// loaded the same version cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty `InMemoryEventRepository`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aggregates with at least one stored event.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let streams = self.streams.read().await;
        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }

    #[allow(clippy::cast_possible_wrap)]
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.write().await;

        let actual = streams.get(&aggregate_id).map_or(0, Vec::len) as i64;
        if actual != expected_version {
            warn!(%aggregate_id, expected_version, actual, "rejecting append on stale version");
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        streams
            .entry(aggregate_id)
            .or_default()
            .extend_from_slice(events);
        debug!(%aggregate_id, appended = events.len(), "events appended");
        Ok(())
    }
}
