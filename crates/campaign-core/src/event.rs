//! Event log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trait that all domain events implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name (used for serialization routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be represented.
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;

    /// When the fact described by this event happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// An event as appended to a stream: the serialized event plus its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Stream (aggregate identity) this event belongs to.
    pub stream_id: String,
    /// Position within the stream, starting at 1.
    pub version: i64,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Timestamp carried by the domain event.
    pub occurred_at: DateTime<Utc>,
}

impl EventRecord {
    /// Wraps `event` as the record at `version` of `stream_id`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload cannot be serialized.
    pub fn from_event<E: DomainEvent>(
        stream_id: &str,
        version: i64,
        event: &E,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            stream_id: stream_id.to_owned(),
            version,
            event_type: event.event_type().to_owned(),
            payload: event.to_payload()?,
            occurred_at: event.occurred_at(),
        })
    }
}

/// Builds records for `events`, numbered consecutively after `last_version`.
///
/// # Errors
///
/// Returns the first `serde_json` error raised by a payload.
pub fn sequence_records<E: DomainEvent>(
    stream_id: &str,
    events: &[E],
    last_version: i64,
) -> Result<Vec<EventRecord>, serde_json::Error> {
    (last_version + 1..)
        .zip(events)
        .map(|(version, event)| EventRecord::from_event(stream_id, version, event))
        .collect()
}
