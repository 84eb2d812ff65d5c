//! Content-addressed record sink
//!
//! `RecordStore::commit` checks for an existing id before inserting. Two
//! workers may both pass that check for the same quote; the document store's
//! unique key then rejects the second insert, and that rejection is reported
//! as `CommitOutcome::Duplicate` rather than as an error.

use crate::crawler::RetryPolicy;
use crate::state::Record;
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use std::sync::Arc;

/// How a commit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The record was new and is now stored
    Inserted,

    /// A record with the same id already existed; nothing was written
    Duplicate,
}

/// Record sink with bounded retries on transient store failures
pub struct RecordStore {
    documents: Arc<dyn DocumentStore>,
    retry: RetryPolicy,
}

impl RecordStore {
    pub fn new(documents: Arc<dyn DocumentStore>, retry: RetryPolicy) -> Self {
        Self { documents, retry }
    }

    /// Returns true if a record with `id` is already stored
    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        let documents = &self.documents;
        self.retry
            .run_sync("record lookup", || documents.record_exists(id))
            .await
    }

    /// Persists `record` unconditionally
    pub async fn insert(&self, record: &Record) -> StorageResult<()> {
        let documents = &self.documents;
        self.retry
            .run_sync("record insert", || documents.insert_record(record))
            .await
    }

    /// Stores `record` unless one with the same id already exists
    pub async fn commit(&self, record: &Record) -> StorageResult<CommitOutcome> {
        if self.exists(&record.id).await? {
            return Ok(CommitOutcome::Duplicate);
        }

        match self.insert(record).await {
            Ok(()) => Ok(CommitOutcome::Inserted),
            Err(StorageError::Duplicate(_)) => Ok(CommitOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }

    /// Total number of stored records
    pub async fn count(&self) -> StorageResult<u64> {
        let documents = &self.documents;
        self.retry
            .run_sync("record count", || documents.count_records())
            .await
    }
}
