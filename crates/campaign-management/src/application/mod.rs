//! Application services for the Campaign Management context.

pub mod command_handlers;
pub mod query_handlers;
