//! Campaign platform: HTTP API.
//!
//! Exposes the Campaign Management context over JSON and maps the domain
//! error taxonomy to HTTP status codes.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
