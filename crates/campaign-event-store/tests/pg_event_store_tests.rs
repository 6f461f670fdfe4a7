//! Integration tests for `PgEventStore`.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL`; run them
//! with `cargo test -- --ignored`.

use chrono::{DateTime, TimeZone, Utc};
use campaign_core::event::EventRecord;
use campaign_core::store::{EventStore, StoreError};
use campaign_event_store::pg_event_store::PgEventStore;
use sqlx::PgPool;
use uuid::Uuid;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// Helper to build an `EventRecord` with sensible defaults.
fn make_record(stream_id: &str, version: i64) -> EventRecord {
    EventRecord {
        event_id: Uuid::new_v4(),
        stream_id: stream_id.to_owned(),
        version,
        event_type: "TestEvent".to_owned(),
        payload: serde_json::json!({ "key": "value" }),
        occurred_at: fixed_now(),
    }
}

fn new_stream_id() -> String {
    Uuid::new_v4().to_string()
}

// --- read_stream ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_read_stream_is_empty_for_nonexistent_stream(pool: PgPool) {
    let store = PgEventStore::new(pool);

    let slice = store
        .read_stream(&new_stream_id(), serde_json::json!({}))
        .await
        .unwrap();

    assert!(slice.is_empty());
}

// --- append + read round-trip ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_append_and_read_single_event(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = new_stream_id();
    let record = make_record(&stream_id, 1);

    store
        .append(&stream_id, std::slice::from_ref(&record), 0)
        .await
        .unwrap();

    let slice = store
        .read_stream(&stream_id, serde_json::json!({}))
        .await
        .unwrap();
    assert_eq!(slice.events, vec![record]);
    assert_eq!(slice.snapshot_version, None);
}

// --- ordering ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_append_multiple_batches_preserves_version_order(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = new_stream_id();

    store
        .append(
            &stream_id,
            &[make_record(&stream_id, 1), make_record(&stream_id, 2)],
            0,
        )
        .await
        .unwrap();
    store
        .append(&stream_id, &[make_record(&stream_id, 3)], 2)
        .await
        .unwrap();

    let slice = store
        .read_stream(&stream_id, serde_json::json!({}))
        .await
        .unwrap();
    let versions: Vec<i64> = slice.events.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![1, 2, 3]);
}

// --- concurrency ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrency_error_on_stale_expected_version(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = new_stream_id();

    store
        .append(&stream_id, &[make_record(&stream_id, 1)], 0)
        .await
        .unwrap();

    let result = store
        .append(&stream_id, &[make_record(&stream_id, 1)], 0)
        .await;

    match result {
        Err(StoreError::Concurrency(err)) => {
            assert_eq!(err.stream_id, stream_id);
            assert_eq!(err.expected, 0);
            assert_eq!(err.actual, 1);
        }
        other => panic!("expected Concurrency, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_gapped_batch_writes_nothing(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = new_stream_id();

    let result = store
        .append(
            &stream_id,
            &[make_record(&stream_id, 1), make_record(&stream_id, 3)],
            0,
        )
        .await;

    assert!(matches!(result, Err(StoreError::InvalidVersion { .. })));
    let slice = store
        .read_stream(&stream_id, serde_json::json!({}))
        .await
        .unwrap();
    assert!(slice.events.is_empty());
}

// --- snapshots ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_snapshot_cuts_off_replay_and_is_overwritten(pool: PgPool) {
    let store = PgEventStore::new(pool);
    let stream_id = new_stream_id();
    let batch: Vec<EventRecord> = (1..=4).map(|v| make_record(&stream_id, v)).collect();
    store.append(&stream_id, &batch, 0).await.unwrap();

    store
        .store_state_as_snapshot(&stream_id, serde_json::json!({ "at": 2 }), 2)
        .await
        .unwrap();
    store
        .store_state_as_snapshot(&stream_id, serde_json::json!({ "at": 3 }), 3)
        .await
        .unwrap();

    let slice = store
        .read_stream(&stream_id, serde_json::json!({ "initial": true }))
        .await
        .unwrap();
    let versions: Vec<i64> = slice.events.iter().map(|e| e.version).collect();
    assert_eq!(versions, vec![4]);
    assert_eq!(slice.state, serde_json::json!({ "at": 3 }));
    assert_eq!(slice.snapshot_version, Some(3));
}
