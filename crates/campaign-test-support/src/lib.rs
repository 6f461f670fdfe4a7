//! Shared test doubles and utilities for the campaign platform.

mod clock;
mod store;

pub use clock::FixedClock;
pub use store::{
    ConflictingEventStore, FailingEventStore, RecordingEventStore, SnapshotFailingEventStore,
    StoreCall,
};
