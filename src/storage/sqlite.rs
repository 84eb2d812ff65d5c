//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of both the
//! `QueueStore` and `DocumentStore` traits. One connection sits behind a
//! mutex, so every trait method runs as a single serialized statement.

use crate::state::Record;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{DocumentStore, QueueStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (creating if needed) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }
}

impl QueueStore for SqliteStorage {
    fn queue_exists(&self, queue: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM queue_entries WHERE queue = ?1)",
            params![queue],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn push_back(&self, queue: &str, url: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO queue_entries (queue, url) VALUES (?1, ?2)",
            params![queue, url],
        )?;
        Ok(())
    }

    fn pop_front(&self, queue: &str) -> StorageResult<Option<String>> {
        let conn = self.conn()?;
        let url = conn
            .query_row(
                "DELETE FROM queue_entries
                 WHERE seq = (SELECT seq FROM queue_entries WHERE queue = ?1 ORDER BY seq LIMIT 1)
                 RETURNING url",
                params![queue],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url)
    }

    fn queue_len(&self, queue: &str) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM queue_entries WHERE queue = ?1",
            params![queue],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn clear_queue(&self, queue: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM queue_entries WHERE queue = ?1", params![queue])?;
        Ok(())
    }

    fn set_add(&self, set: &str, member: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO set_members (set_name, member, added_at) VALUES (?1, ?2, ?3)",
            params![set, member, now],
        )?;
        Ok(inserted > 0)
    }

    fn set_contains(&self, set: &str, member: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM set_members WHERE set_name = ?1 AND member = ?2)",
            params![set, member],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn set_len(&self, set: &str) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM set_members WHERE set_name = ?1",
            params![set],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn clear_set(&self, set: &str) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM set_members WHERE set_name = ?1", params![set])?;
        Ok(())
    }
}

impl DocumentStore for SqliteStorage {
    fn record_exists(&self, id: &str) -> StorageResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM records WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn insert_record(&self, record: &Record) -> StorageResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO records (id, type, title, body, stored_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![record.id, record.kind, record.title, record.body, now],
        )?;
        Ok(())
    }

    fn get_record(&self, id: &str) -> StorageResult<Option<Record>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, type, title, body FROM records WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Record {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        title: row.get(2)?,
                        body: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_records_by_kind(&self) -> StorageResult<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT type, COUNT(*) AS n FROM records GROUP BY type ORDER BY n DESC, type ASC",
        )?;

        let counts = stmt
            .query_map([], |row| {
                let kind: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((kind, count as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
