//! Domain model for the Campaign Management context.

pub mod aggregates;
pub mod business_type;
pub mod campaign_id;
pub mod commands;
pub mod events;
