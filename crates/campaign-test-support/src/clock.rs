//! Test clock: deterministic `Clock` implementation for tests.

use campaign_core::clock::Clock;
use chrono::{DateTime, TimeZone, Utc};

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock pinned to 2026-01-15T10:00:00Z, the instant shared by the
    /// test suites.
    #[must_use]
    pub fn reference() -> Self {
        Self(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).single().unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
