//! `SQLite` schema definitions for metrictrack.
//!
//! The whole metric collection lives as one JSON document under a single key,
//! so the schema is a plain key-value table.

/// SQL statement to create the key-value table.
pub const CREATE_KV_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to read a value by key.
pub const SELECT_VALUE: &str = "SELECT value FROM kv WHERE key = ?1";

/// SQL statement to write a value, replacing any previous one.
pub const UPSERT_VALUE: &str = r"
INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[CREATE_KV_TABLE];
