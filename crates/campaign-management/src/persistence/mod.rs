//! Event-sourced persistence for campaigns.

pub mod repository;
pub mod state;
