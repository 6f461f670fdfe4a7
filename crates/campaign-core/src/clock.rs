//! Clock abstraction so event timestamps stay deterministic under test.

use chrono::{DateTime, Utc};

/// Source of "now" for event timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
