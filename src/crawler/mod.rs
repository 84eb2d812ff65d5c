//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and charset decoding with retry logic
//! - Page classification, record and link extraction
//! - The shared frontier of pending and visited URLs
//! - The worker pool and overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod retry;
mod worker;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{
    ExtractError, Extraction, Extractor, MalformedParagraphPolicy, PageAnalysis, PageKind,
};
pub use fetcher::{build_http_client, decode_page, Charset, FetchError, Fetcher, Page};
pub use frontier::{Frontier, Lease};
pub use retry::{RetryPolicy, Transient};
pub use worker::{CrawlContext, CrawlStats, CrawlSummary, Worker};

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the storage database
/// 2. Clear the frontier if `fresh` is set
/// 3. Seed the frontier with the site root unless work is already queued
/// 4. Run the worker pool until the frontier drains or Ctrl-C is pressed
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `fresh` - Whether to discard the pending queue and visited set first
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Counters for the run
/// * `Err(HarvestError)` - Setup failed
pub async fn crawl(config: Config, fresh: bool) -> Result<CrawlSummary> {
    run_crawl(config, fresh).await
}
