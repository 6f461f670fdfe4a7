//! Command abstractions.

use uuid::Uuid;

/// Trait that all application commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Routing name for this command, used in log fields.
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;
}
