//! Event store abstraction.
//!
//! Any backing implementation must honour the contract documented on
//! [`EventStore`]: contiguous versions checked before anything is written,
//! all-or-nothing appends, and snapshot cutoff on reads. The repository's
//! correctness depends on it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::EventRecord;

/// Boxed cause attached to opaque storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised when the stream head moved since the writer last observed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("concurrency error in stream {stream_id}: expected version {expected}, found {actual}")]
pub struct ConcurrencyError {
    /// The stream being appended to.
    pub stream_id: String,
    /// The version the writer presented.
    pub expected: i64,
    /// The stream's latest version at append time.
    pub actual: i64,
}

/// Store-level error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency check failed. Nothing was written.
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// A record in the batch does not continue the stream contiguously.
    #[error("invalid event version for stream {stream_id}: expected {expected}, got {actual}")]
    InvalidVersion {
        /// The stream being appended to.
        stream_id: String,
        /// The version the record should have carried.
        expected: i64,
        /// The version it actually carried.
        actual: i64,
    },

    /// A record in the batch names a different stream.
    #[error("record for stream {found} cannot be appended to stream {stream_id}")]
    MismatchedStream {
        /// The stream being appended to.
        stream_id: String,
        /// The stream id carried by the record.
        found: String,
    },

    /// Stored data could not be decoded or violates an integrity rule.
    #[error("corrupted data in stream {stream_id}: {reason}")]
    Corrupted {
        /// The stream holding the bad data.
        stream_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Opaque storage failure (I/O, connection, driver).
    #[error("event store failure: {message}")]
    Internal {
        /// What the store was doing.
        message: String,
        /// The underlying cause.
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Builds an `Internal` error with its cause attached.
    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Builds a `Corrupted` error for `stream_id`.
    pub fn corrupted(stream_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            stream_id: stream_id.into(),
            reason: reason.into(),
        }
    }
}

/// The folded state of a stream as of a specific version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stream the snapshot belongs to.
    pub stream_id: String,
    /// Serialized state.
    pub state: serde_json::Value,
    /// Version of the last event folded into `state`.
    pub version: i64,
}

/// Result of [`EventStore::read_stream`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSlice {
    /// Events to replay, in version order.
    pub events: Vec<EventRecord>,
    /// Base state to replay `events` onto.
    pub state: serde_json::Value,
    /// Version the base state was taken at, when it came from a snapshot.
    pub snapshot_version: Option<i64>,
}

impl StreamSlice {
    /// Whether the stream has neither events nor a snapshot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.snapshot_version.is_none()
    }

    /// The stream version after replaying this slice.
    #[must_use]
    pub fn last_version(&self) -> i64 {
        self.events
            .last()
            .map(|record| record.version)
            .or(self.snapshot_version)
            .unwrap_or(0)
    }
}

/// Append-only per-stream event log with snapshot storage.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends `records` to `stream_id` if its latest version equals
    /// `expected_version` (0 for a stream that must not exist yet).
    ///
    /// Records must carry versions `expected_version + 1 ..` in order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Concurrency` on a version mismatch,
    /// `StoreError::InvalidVersion` or `StoreError::MismatchedStream` for a
    /// malformed batch, and `StoreError::Internal` on storage failure. In
    /// every error case the stream is left untouched.
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError>;

    /// Reads the stream, starting after the current snapshot if one exists.
    ///
    /// Without a snapshot, returns every event paired with `initial_state`.
    /// With one, returns only events past its version paired with its state.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` on storage failure.
    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError>;

    /// Replaces the stream's snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` on storage failure.
    async fn store_state_as_snapshot(
        &self,
        stream_id: &str,
        state: serde_json::Value,
        version_applied_through: i64,
    ) -> Result<(), StoreError>;
}

/// Checks that `records` continue `stream_id` contiguously after
/// `expected_version`. Implementations call this before writing anything.
///
/// # Errors
///
/// Returns `StoreError::MismatchedStream` or `StoreError::InvalidVersion`
/// for the first offending record.
pub fn validate_batch(
    stream_id: &str,
    records: &[EventRecord],
    expected_version: i64,
) -> Result<(), StoreError> {
    for (expected, record) in (expected_version + 1..).zip(records) {
        if record.stream_id != stream_id {
            return Err(StoreError::MismatchedStream {
                stream_id: stream_id.to_owned(),
                found: record.stream_id.clone(),
            });
        }
        if record.version != expected {
            return Err(StoreError::InvalidVersion {
                stream_id: stream_id.to_owned(),
                expected,
                actual: record.version,
            });
        }
    }
    Ok(())
}
