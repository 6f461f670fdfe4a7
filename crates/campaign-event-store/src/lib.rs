//! Campaign Event Store: `EventStore` backends.
//!
//! `InMemoryEventStore` serves tests and single-process deployments;
//! `PgEventStore` persists streams and snapshots in PostgreSQL.

pub mod in_memory_event_store;
pub mod pg_event_store;
pub mod schema;
