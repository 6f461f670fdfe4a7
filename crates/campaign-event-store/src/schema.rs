//! Event store database schema.

/// SQL to create the events table.
pub const CREATE_EVENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS campaign_events (
    stream_id   TEXT NOT NULL,
    version     BIGINT NOT NULL CHECK (version >= 1),
    event_id    UUID NOT NULL UNIQUE,
    event_type  VARCHAR(255) NOT NULL,
    payload     JSONB NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (stream_id, version)
);
";

/// SQL to create the snapshots table. One row per stream.
pub const CREATE_SNAPSHOTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS campaign_snapshots (
    stream_id TEXT PRIMARY KEY,
    state     JSONB NOT NULL,
    version   BIGINT NOT NULL CHECK (version >= 1),
    taken_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";
