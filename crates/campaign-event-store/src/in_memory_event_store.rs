//! In-memory implementation of the `EventStore` trait.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, instrument};

use campaign_core::event::EventRecord;
use campaign_core::store::{
    ConcurrencyError, EventStore, Snapshot, StoreError, StreamSlice, validate_batch,
};

#[derive(Debug, Default)]
struct Inner {
    streams: HashMap<String, Vec<EventRecord>>,
    snapshots: HashMap<String, Snapshot>,
}

/// Event store that keeps streams and snapshots in process memory.
///
/// Every append runs under a single write lock, so a batch is either fully
/// visible or not at all.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: RwLock<Inner>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record of a stream, ignoring snapshots.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the store lock is poisoned.
    pub fn stream_events(&self, stream_id: &str) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self
            .read()?
            .streams
            .get(stream_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Returns the current snapshot of a stream, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the store lock is poisoned.
    pub fn snapshot(&self, stream_id: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.read()?.snapshots.get(stream_id).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::internal("in-memory store lock poisoned", "poisoned read lock"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| {
            StoreError::internal("in-memory store lock poisoned", "poisoned write lock")
        })
    }
}

fn latest_version(events: Option<&Vec<EventRecord>>) -> i64 {
    events
        .and_then(|events| events.last())
        .map_or(0, |record| record.version)
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[instrument(skip(self, records), fields(event_count = records.len()))]
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        let actual = latest_version(inner.streams.get(stream_id));
        if actual != expected_version {
            return Err(ConcurrencyError {
                stream_id: stream_id.to_owned(),
                expected: expected_version,
                actual,
            }
            .into());
        }
        validate_batch(stream_id, records, expected_version)?;

        if records.is_empty() {
            return Ok(());
        }
        inner
            .streams
            .entry(stream_id.to_owned())
            .or_default()
            .extend_from_slice(records);
        drop(inner);

        debug!(stream_id, events_appended = records.len(), "events appended");
        Ok(())
    }

    #[instrument(skip(self, initial_state))]
    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        let inner = self.read()?;
        let events = inner.streams.get(stream_id).map_or(&[][..], Vec::as_slice);

        let slice = match inner.snapshots.get(stream_id) {
            Some(snapshot) => StreamSlice {
                events: events
                    .iter()
                    .filter(|record| record.version > snapshot.version)
                    .cloned()
                    .collect(),
                state: snapshot.state.clone(),
                snapshot_version: Some(snapshot.version),
            },
            None => StreamSlice {
                events: events.to_vec(),
                state: initial_state,
                snapshot_version: None,
            },
        };
        drop(inner);

        debug!(
            stream_id,
            events_read = slice.events.len(),
            snapshot_version = ?slice.snapshot_version,
            "stream read"
        );
        Ok(slice)
    }

    #[instrument(skip(self, state))]
    async fn store_state_as_snapshot(
        &self,
        stream_id: &str,
        state: serde_json::Value,
        version_applied_through: i64,
    ) -> Result<(), StoreError> {
        self.write()?.snapshots.insert(
            stream_id.to_owned(),
            Snapshot {
                stream_id: stream_id.to_owned(),
                state,
                version: version_applied_through,
            },
        );
        debug!(stream_id, version_applied_through, "snapshot stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn record(stream_id: &str, version: i64) -> EventRecord {
        EventRecord {
            event_id: Uuid::new_v4(),
            stream_id: stream_id.to_owned(),
            version,
            event_type: "test.event".to_owned(),
            payload: serde_json::json!({ "n": version }),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_rejects_stale_version_without_mutation() {
        // Arrange
        let store = InMemoryEventStore::new();
        store.append("c1", &[record("c1", 1)], 0).await.unwrap();

        // Act
        let result = store.append("c1", &[record("c1", 1)], 0).await;

        // Assert
        match result {
            Err(StoreError::Concurrency(err)) => {
                assert_eq!(err.stream_id, "c1");
                assert_eq!(err.expected, 0);
                assert_eq!(err.actual, 1);
            }
            other => panic!("expected Concurrency, got {other:?}"),
        }
        assert_eq!(store.stream_events("c1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_rejects_gapped_batch_atomically() {
        let store = InMemoryEventStore::new();

        let result = store
            .append("c1", &[record("c1", 1), record("c1", 3)], 0)
            .await;

        assert!(matches!(result, Err(StoreError::InvalidVersion { .. })));
        assert!(store.stream_events("c1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_stream_without_snapshot_returns_initial_state() {
        // Arrange
        let store = InMemoryEventStore::new();
        store
            .append("c1", &[record("c1", 1), record("c1", 2)], 0)
            .await
            .unwrap();
        let initial = serde_json::json!({ "initial": true });

        // Act
        let slice = store.read_stream("c1", initial.clone()).await.unwrap();

        // Assert
        assert_eq!(slice.events.len(), 2);
        assert_eq!(slice.state, initial);
        assert_eq!(slice.snapshot_version, None);
    }

    #[tokio::test]
    async fn test_snapshot_overwrites_previous_one() {
        let store = InMemoryEventStore::new();

        store
            .store_state_as_snapshot("c1", serde_json::json!(1), 1)
            .await
            .unwrap();
        store
            .store_state_as_snapshot("c1", serde_json::json!(2), 2)
            .await
            .unwrap();

        let snapshot = store.snapshot("c1").unwrap().unwrap();
        assert_eq!(snapshot.state, serde_json::json!(2));
        assert_eq!(snapshot.version, 2);
    }
}
