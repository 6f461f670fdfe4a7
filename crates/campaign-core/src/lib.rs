//! Campaign Core: shared event-sourcing abstractions.
//!
//! This crate defines the event log types, the `EventStore` contract, the
//! observer list aggregates emit through, and the collector that buffers
//! emitted events per aggregate instance. It contains no storage backends.

pub mod clock;
pub mod collector;
pub mod command;
pub mod emitter;
pub mod error;
pub mod event;
pub mod store;
pub mod tracking;
