//! Test event stores: `EventStore` doubles for repository tests.

use std::sync::Mutex;

use async_trait::async_trait;
use campaign_core::event::EventRecord;
use campaign_core::store::{ConcurrencyError, EventStore, StoreError, StreamSlice};
use campaign_event_store::in_memory_event_store::InMemoryEventStore;

/// A call observed by [`RecordingEventStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// `append` with the versions of the records it carried.
    Append {
        /// Target stream.
        stream_id: String,
        /// Versions of the appended records, in order.
        versions: Vec<i64>,
        /// Expected version presented by the caller.
        expected_version: i64,
    },
    /// `read_stream`.
    ReadStream {
        /// Target stream.
        stream_id: String,
    },
    /// `store_state_as_snapshot`.
    StoreSnapshot {
        /// Target stream.
        stream_id: String,
        /// Version the snapshot was taken at.
        version: i64,
    },
}

/// An in-memory event store that records every call before delegating.
#[derive(Debug, Default)]
pub struct RecordingEventStore {
    inner: InMemoryEventStore,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingEventStore {
    /// Creates an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for inspecting what was persisted.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventStore {
        &self.inner
    }

    /// All calls observed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the `append` calls observed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn append_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::Append { .. }))
            .collect()
    }

    /// Only the `store_state_as_snapshot` calls observed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot_calls(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, StoreCall::StoreSnapshot { .. }))
            .collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Append {
            stream_id: stream_id.to_owned(),
            versions: records.iter().map(|record| record.version).collect(),
            expected_version,
        });
        self.inner.append(stream_id, records, expected_version).await
    }

    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        self.record(StoreCall::ReadStream {
            stream_id: stream_id.to_owned(),
        });
        self.inner.read_stream(stream_id, initial_state).await
    }

    async fn store_state_as_snapshot(
        &self,
        stream_id: &str,
        state: serde_json::Value,
        version_applied_through: i64,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::StoreSnapshot {
            stream_id: stream_id.to_owned(),
            version: version_applied_through,
        });
        self.inner
            .store_state_as_snapshot(stream_id, state, version_applied_through)
            .await
    }
}

/// An event store whose every operation fails with `StoreError::Internal`.
#[derive(Debug)]
pub struct FailingEventStore;

fn unavailable() -> StoreError {
    StoreError::internal("event store unavailable", "connection refused")
}

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(
        &self,
        _stream_id: &str,
        _records: &[EventRecord],
        _expected_version: i64,
    ) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn read_stream(
        &self,
        _stream_id: &str,
        _initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        Err(unavailable())
    }

    async fn store_state_as_snapshot(
        &self,
        _stream_id: &str,
        _state: serde_json::Value,
        _version_applied_through: i64,
    ) -> Result<(), StoreError> {
        Err(unavailable())
    }
}

/// An in-memory event store whose snapshot writes always fail.
#[derive(Debug, Default)]
pub struct SnapshotFailingEventStore {
    inner: InMemoryEventStore,
}

impl SnapshotFailingEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped store, for inspecting what was persisted.
    #[must_use]
    pub fn inner(&self) -> &InMemoryEventStore {
        &self.inner
    }
}

#[async_trait]
impl EventStore for SnapshotFailingEventStore {
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError> {
        self.inner.append(stream_id, records, expected_version).await
    }

    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        self.inner.read_stream(stream_id, initial_state).await
    }

    async fn store_state_as_snapshot(
        &self,
        _stream_id: &str,
        _state: serde_json::Value,
        _version_applied_through: i64,
    ) -> Result<(), StoreError> {
        Err(StoreError::internal("snapshot write failed", "disk full"))
    }
}

/// An in-memory event store where every append to an existing stream loses
/// the race: another writer always got there one version earlier.
///
/// Creating a stream (expected version 0) still succeeds.
#[derive(Debug, Default)]
pub struct ConflictingEventStore {
    inner: InMemoryEventStore,
}

impl ConflictingEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for ConflictingEventStore {
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError> {
        if expected_version == 0 {
            return self.inner.append(stream_id, records, expected_version).await;
        }
        Err(ConcurrencyError {
            stream_id: stream_id.to_owned(),
            expected: expected_version,
            actual: expected_version + 1,
        }
        .into())
    }

    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        self.inner.read_stream(stream_id, initial_state).await
    }

    async fn store_state_as_snapshot(
        &self,
        stream_id: &str,
        state: serde_json::Value,
        version_applied_through: i64,
    ) -> Result<(), StoreError> {
        self.inner
            .store_state_as_snapshot(stream_id, state, version_applied_through)
            .await
    }
}
