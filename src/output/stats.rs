//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! record and frontier counts from the storage layer.

use crate::config::OutputConfig;
use crate::storage::{DocumentStore, QueueStore, StorageResult};

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Stored records per category, largest first
    pub records_by_kind: Vec<(String, u64)>,

    /// URLs marked visited
    pub visited: u64,

    /// URLs waiting in the queue
    pub pending: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `output` - Names of the queue and visited set
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S>(storage: &S, output: &OutputConfig) -> StorageResult<CrawlStatistics>
where
    S: QueueStore + DocumentStore,
{
    let mut records_by_kind = storage.count_records_by_kind()?;
    records_by_kind.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    Ok(CrawlStatistics {
        total_records: storage.count_records()?,
        records_by_kind,
        visited: storage.set_len(&output.visited_set)?,
        pending: storage.queue_len(&output.queue_name)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Records stored: {}", stats.total_records);
    println!("  URLs visited: {}", stats.visited);
    println!("  URLs pending: {}", stats.pending);
    println!();

    if !stats.records_by_kind.is_empty() {
        println!("Records by Category:");
        for (kind, count) in &stats.records_by_kind {
            let percentage = if stats.total_records > 0 {
                (*count as f64 / stats.total_records as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", kind, count, percentage);
        }
        println!();
    }
}
