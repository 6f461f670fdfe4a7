//! `PostgreSQL` implementation of the `EventStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use campaign_core::event::EventRecord;
use campaign_core::store::{
    ConcurrencyError, EventStore, StoreError, StreamSlice, validate_batch,
};

use crate::schema::{CREATE_EVENTS_TABLE, CREATE_SNAPSHOTS_TABLE};

/// PostgreSQL-backed event store.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Creates a new `PgEventStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the event and snapshot tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Internal` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for ddl in [CREATE_EVENTS_TABLE, CREATE_SNAPSHOTS_TABLE] {
            sqlx::raw_sql(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::internal("failed to apply event store schema", e))?;
        }
        Ok(())
    }

    async fn current_version(&self, stream_id: &str) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(version), 0) FROM campaign_events WHERE stream_id = $1",
        )
        .bind(stream_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::internal("failed to read stream version", e))
    }
}

/// Locks the stream head row and returns its version (0 for a new stream).
async fn lock_stream_head(
    tx: &mut Transaction<'_, Postgres>,
    stream_id: &str,
) -> Result<i64, sqlx::Error> {
    let head: Option<i64> = sqlx::query_scalar(
        "SELECT version FROM campaign_events WHERE stream_id = $1 \
         ORDER BY version DESC LIMIT 1 FOR UPDATE",
    )
    .bind(stream_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(head.unwrap_or(0))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn record_from_row(row: &PgRow) -> Result<EventRecord, sqlx::Error> {
    Ok(EventRecord {
        event_id: row.try_get::<Uuid, _>("event_id")?,
        stream_id: row.try_get("stream_id")?,
        version: row.try_get("version")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        occurred_at: row.try_get::<DateTime<Utc>, _>("occurred_at")?,
    })
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(skip(self, records), fields(event_count = records.len()))]
    async fn append(
        &self,
        stream_id: &str,
        records: &[EventRecord],
        expected_version: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::internal("failed to begin append transaction", e))?;

        let actual = lock_stream_head(&mut tx, stream_id)
            .await
            .map_err(|e| StoreError::internal("failed to read stream head", e))?;
        if actual != expected_version {
            return Err(ConcurrencyError {
                stream_id: stream_id.to_owned(),
                expected: expected_version,
                actual,
            }
            .into());
        }
        validate_batch(stream_id, records, expected_version)?;

        for record in records {
            let inserted = sqlx::query(
                "INSERT INTO campaign_events \
                 (stream_id, version, event_id, event_type, payload, occurred_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&record.stream_id)
            .bind(record.version)
            .bind(record.event_id)
            .bind(&record.event_type)
            .bind(&record.payload)
            .bind(record.occurred_at)
            .execute(&mut *tx)
            .await;

            if let Err(err) = inserted {
                // Two writers racing on a brand-new stream both see head 0;
                // the primary key decides which one wins.
                if is_unique_violation(&err) {
                    drop(tx);
                    let actual = self.current_version(stream_id).await?;
                    warn!(stream_id, expected_version, actual, "lost append race");
                    return Err(ConcurrencyError {
                        stream_id: stream_id.to_owned(),
                        expected: expected_version,
                        actual,
                    }
                    .into());
                }
                return Err(StoreError::internal("failed to insert event", err));
            }
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::internal("failed to commit append", e))?;

        debug!(stream_id, events_appended = records.len(), "events appended");
        Ok(())
    }

    #[instrument(skip(self, initial_state))]
    async fn read_stream(
        &self,
        stream_id: &str,
        initial_state: serde_json::Value,
    ) -> Result<StreamSlice, StoreError> {
        let snapshot = sqlx::query(
            "SELECT state, version FROM campaign_snapshots WHERE stream_id = $1",
        )
        .bind(stream_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::internal("failed to load snapshot", e))?;

        let (state, snapshot_version) = match snapshot {
            Some(row) => {
                let state: serde_json::Value = row
                    .try_get("state")
                    .map_err(|e| StoreError::corrupted(stream_id, e.to_string()))?;
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| StoreError::corrupted(stream_id, e.to_string()))?;
                (state, Some(version))
            }
            None => (initial_state, None),
        };

        let rows = sqlx::query(
            "SELECT event_id, stream_id, version, event_type, payload, occurred_at \
             FROM campaign_events WHERE stream_id = $1 AND version > $2 ORDER BY version",
        )
        .bind(stream_id)
        .bind(snapshot_version.unwrap_or(0))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::internal("failed to load events", e))?;

        let events = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::corrupted(stream_id, e.to_string()))?;

        debug!(
            stream_id,
            events_read = events.len(),
            ?snapshot_version,
            "stream read"
        );
        Ok(StreamSlice {
            events,
            state,
            snapshot_version,
        })
    }

    #[instrument(skip(self, state))]
    async fn store_state_as_snapshot(
        &self,
        stream_id: &str,
        state: serde_json::Value,
        version_applied_through: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO campaign_snapshots (stream_id, state, version) VALUES ($1, $2, $3) \
             ON CONFLICT (stream_id) DO UPDATE \
             SET state = EXCLUDED.state, version = EXCLUDED.version, taken_at = NOW()",
        )
        .bind(stream_id)
        .bind(&state)
        .bind(version_applied_through)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::internal("failed to store snapshot", e))?;

        debug!(stream_id, version_applied_through, "snapshot stored");
        Ok(())
    }
}
