//! Storage traits and error types
//!
//! This module defines the interfaces of the two external collaborators the
//! crawler depends on: a queue store (named FIFO queues plus named sets) and a
//! document store keyed by record id. Every method is atomic for the single
//! key it touches; nothing here promises atomicity across calls.

use crate::crawler::Transient;
use crate::state::Record;
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Storage lock poisoned")]
    Lock,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, _) = &err {
            match failure.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    return Self::Unavailable(err.to_string());
                }
                ErrorCode::ConstraintViolation
                    if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    return Self::Duplicate(err.to_string());
                }
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}

impl Transient for StorageError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Named FIFO queues and named sets, shared by all workers
pub trait QueueStore: Send + Sync {
    /// Returns true if the named queue currently holds any entry
    fn queue_exists(&self, queue: &str) -> StorageResult<bool>;

    /// Appends `url` to the tail of the queue
    fn push_back(&self, queue: &str, url: &str) -> StorageResult<()>;

    /// Removes and returns the head of the queue, or `None` when it is empty
    fn pop_front(&self, queue: &str) -> StorageResult<Option<String>>;

    /// Number of entries in the queue
    fn queue_len(&self, queue: &str) -> StorageResult<u64>;

    /// Removes every entry from the queue
    fn clear_queue(&self, queue: &str) -> StorageResult<()>;

    /// Adds `member` to the set; returns true if it was not already present
    fn set_add(&self, set: &str, member: &str) -> StorageResult<bool>;

    /// Membership test
    fn set_contains(&self, set: &str, member: &str) -> StorageResult<bool>;

    /// Number of members in the set
    fn set_len(&self, set: &str) -> StorageResult<u64>;

    /// Removes every member from the set
    fn clear_set(&self, set: &str) -> StorageResult<()>;
}

/// Durable record storage with a unique key on the record id
pub trait DocumentStore: Send + Sync {
    /// Returns true if a record with this id is stored
    fn record_exists(&self, id: &str) -> StorageResult<bool>;

    /// Inserts a record
    ///
    /// Fails with `StorageError::Duplicate` if the id is already taken.
    fn insert_record(&self, record: &Record) -> StorageResult<()>;

    /// Gets a record by id
    fn get_record(&self, id: &str) -> StorageResult<Option<Record>>;

    /// Total number of stored records
    fn count_records(&self) -> StorageResult<u64>;

    /// Record counts per category, largest first
    fn count_records_by_kind(&self) -> StorageResult<Vec<(String, u64)>>;
}
