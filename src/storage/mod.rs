//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - The pending URL queue and the visited URL set
//! - Content-addressed record persistence

mod schema;
mod sqlite;
mod store;
mod traits;

pub use sqlite::SqliteStorage;
pub use store::{CommitOutcome, RecordStore};
pub use traits::{DocumentStore, QueueStore, StorageError, StorageResult};
