//! Canonical SQLite schema for the reference event and saved-order store.
//!
//! `events` mirrors the fields the engine reads from a log entry. The
//! free-form categorical fields are kept as one JSON object per row.
//! `rank_orders` holds one JSON array of event ids per period key and is
//! always overwritten as a whole.

/// Migration v1: events and saved orders.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 0);

CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL CHECK (length(date) = 10),
    slot TEXT NOT NULL,
    rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
    name TEXT,
    kind TEXT,
    fields_json TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);

CREATE TABLE IF NOT EXISTS rank_orders (
    period_key TEXT PRIMARY KEY,
    ids_json TEXT NOT NULL
);
";

/// Migration v2: record when each saved order was last replaced.
pub const MIGRATION_V2_SQL: &str = r"
ALTER TABLE rank_orders ADD COLUMN updated_at TEXT;
";
