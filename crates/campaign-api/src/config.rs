//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::num::NonZeroU32;

use campaign_management::persistence::repository::SNAPSHOT_INTERVAL;

use crate::error::AppError;

/// Runtime configuration for the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// `PostgreSQL` connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Number of events between snapshots.
    pub snapshot_interval: NonZeroU32,
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `DATABASE_URL` and `SNAPSHOT_INTERVAL`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => 3000,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let snapshot_interval = lookup("SNAPSHOT_INTERVAL")
            .unwrap_or_else(|| SNAPSHOT_INTERVAL.to_string())
            .parse::<NonZeroU32>()
            .map_err(|e| {
                AppError::Config(format!("SNAPSHOT_INTERVAL must be a positive integer: {e}"))
            })?;

        Ok(Self {
            host,
            port,
            database_url,
            snapshot_interval,
        })
    }

    /// The socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `host` and `port` do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}
