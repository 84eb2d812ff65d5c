//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Motto-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Pending URL queues (FIFO by seq)
CREATE TABLE IF NOT EXISTS queue_entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_entries_queue ON queue_entries(queue, seq);

-- Named sets (visited URLs)
CREATE TABLE IF NOT EXISTS set_members (
    set_name TEXT NOT NULL,
    member TEXT NOT NULL,
    added_at TEXT NOT NULL,
    PRIMARY KEY (set_name, member)
);

-- Extracted quotes, keyed by content hash
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_type ON records(type);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
