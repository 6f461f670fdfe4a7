//! Domain error types.
//!
//! `DomainError` is the vocabulary callers of the repository see. Storage
//! failures arrive here only through `PersistenceFailure`, which keeps the
//! original `StoreError` as its source.

use thiserror::Error;

use crate::store::StoreError;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate with this identity has already been created.
    #[error("aggregate already exists: {0}")]
    AlreadyExists(String),

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// Optimistic concurrency conflict. Reload the aggregate and retry.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The version the writer last observed.
        expected: i64,
        /// The version found in the store.
        actual: i64,
    },

    /// The aggregate was not obtained through the repository.
    #[error("aggregate {0} is not tracked; create or load it through the repository before saving")]
    NotTracked(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The underlying event store failed.
    #[error("persistence failure for aggregate {aggregate_id}: {source}")]
    PersistenceFailure {
        /// The aggregate being loaded or saved.
        aggregate_id: String,
        /// The store error that caused the failure.
        #[source]
        source: StoreError,
    },
}

impl DomainError {
    /// Wraps a store error raised while loading or saving `aggregate_id`.
    pub fn persistence(aggregate_id: impl Into<String>, source: StoreError) -> Self {
        Self::PersistenceFailure {
            aggregate_id: aggregate_id.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_persistence_failure_keeps_store_error_as_source() {
        // Arrange
        let store_error = StoreError::internal("insert failed", "connection reset");

        // Act
        let err = DomainError::persistence("c1", store_error);

        // Assert
        assert!(err.to_string().contains("c1"));
        let source = err.source().unwrap();
        assert!(source.to_string().contains("insert failed"));
        assert_eq!(
            source.source().unwrap().to_string(),
            "connection reset"
        );
    }

    #[test]
    fn test_concurrency_conflict_message_includes_versions() {
        let err = DomainError::ConcurrencyConflict {
            aggregate_id: "c1".to_owned(),
            expected: 3,
            actual: 5,
        };

        assert_eq!(
            err.to_string(),
            "concurrency conflict on aggregate c1: expected version 3, found 5"
        );
    }
}
