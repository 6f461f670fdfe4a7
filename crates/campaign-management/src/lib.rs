//! Campaign platform: Campaign Management bounded context.
//!
//! Owns the `Campaign` aggregate, its events, the event-sourced repository
//! that rebuilds campaigns from their streams, and the application handlers
//! the HTTP layer calls.

pub mod application;
pub mod domain;
pub mod persistence;
