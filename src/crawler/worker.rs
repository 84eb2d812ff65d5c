//! Crawl worker
//!
//! Each worker loops over: dequeue, visited check, fetch, extract, commit
//! records, enqueue links, mark visited. No failure inside one iteration
//! ends the loop; only cancellation does.

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{Fetcher, Page};
use crate::crawler::frontier::Frontier;
use crate::state::{Record, WorkerState, WorkerStatus};
use crate::storage::{CommitOutcome, RecordStore};
use crate::url::Canonicalizer;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Counters describing a finished (or interrupted) crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Pages fetched and decoded
    pub pages_fetched: u64,

    /// Pages that could not be fetched or decoded
    pub pages_failed: u64,

    /// Dequeued URLs that were already visited
    pub pages_skipped: u64,

    /// Records newly stored
    pub records_committed: u64,

    /// Records whose content was already stored
    pub records_duplicate: u64,

    /// Links pushed onto the queue
    pub links_enqueued: u64,

    /// URLs put back on the queue because shutdown interrupted their fetch
    pub pages_requeued: u64,
}

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicU64,
    pages_failed: AtomicU64,
    pages_skipped: AtomicU64,
    records_committed: AtomicU64,
    records_duplicate: AtomicU64,
    links_enqueued: AtomicU64,
    pages_requeued: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CrawlStats {
    pub fn summary(&self) -> CrawlSummary {
        CrawlSummary {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            pages_failed: self.pages_failed.load(Ordering::Relaxed),
            pages_skipped: self.pages_skipped.load(Ordering::Relaxed),
            records_committed: self.records_committed.load(Ordering::Relaxed),
            records_duplicate: self.records_duplicate.load(Ordering::Relaxed),
            links_enqueued: self.links_enqueued.load(Ordering::Relaxed),
            pages_requeued: self.pages_requeued.load(Ordering::Relaxed),
        }
    }
}

/// Collaborators shared by every worker of one crawl
pub struct CrawlContext {
    pub frontier: Frontier,
    pub fetcher: Fetcher,
    pub extractor: Extractor,
    pub canonicalizer: Canonicalizer,
    pub records: RecordStore,
    pub stats: CrawlStats,
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    context: Arc<CrawlContext>,
    status: Arc<WorkerStatus>,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        context: Arc<CrawlContext>,
        status: Arc<WorkerStatus>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            context,
            status,
            cancel,
        }
    }

    /// Processes URLs until cancelled
    pub async fn run(self) {
        tracing::debug!("Worker {} started", self.id);

        while let Some(lease) = self.context.frontier.dequeue_blocking(&self.cancel).await {
            self.process(lease.url()).await;
            self.status.set(WorkerState::Idle);
            // Dropping the lease ends the in-flight window, after visited-marking
            drop(lease);
        }

        self.status.set(WorkerState::Idle);
        tracing::debug!("Worker {} stopped", self.id);
    }

    /// Runs one loop iteration for `url`
    async fn process(&self, url: &str) {
        let ctx = &self.context;

        match ctx.frontier.is_visited(url).await {
            Ok(true) => {
                tracing::debug!("Worker {}: already visited {}", self.id, url);
                bump(&ctx.stats.pages_skipped);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Worker {}: visited check failed for {}: {}", self.id, url, e);
            }
        }

        self.status.set(WorkerState::Working);
        tracing::debug!("Worker {}: fetching {}", self.id, url);

        let fetched = tokio::select! {
            result = ctx.fetcher.fetch(url) => result,
            _ = self.cancel.cancelled() => {
                self.requeue(url).await;
                return;
            }
        };

        match fetched {
            Ok(page) => {
                bump(&ctx.stats.pages_fetched);
                if page.is_empty() {
                    tracing::debug!("Worker {}: empty page {}", self.id, url);
                } else {
                    self.handle_page(&page).await;
                }
            }
            Err(e) if self.cancel.is_cancelled() => {
                // Retries were cut short, not exhausted
                tracing::debug!("Worker {}: {} (shutting down)", self.id, e);
                self.requeue(url).await;
                return;
            }
            Err(e) => {
                bump(&ctx.stats.pages_failed);
                tracing::warn!("Worker {}: {}", self.id, e);
            }
        }

        if let Err(e) = ctx.frontier.mark_visited(url).await {
            tracing::warn!("Worker {}: could not mark {} visited: {}", self.id, url, e);
        }
    }

    /// Puts `url` back unvisited so a resumed crawl fetches it
    async fn requeue(&self, url: &str) {
        let ctx = &self.context;
        match ctx.frontier.enqueue(url).await {
            Ok(()) => {
                bump(&ctx.stats.pages_requeued);
                tracing::info!("Worker {}: shutdown interrupted {}, requeued", self.id, url);
            }
            Err(e) => tracing::warn!("Worker {}: could not requeue {}: {}", self.id, url, e),
        }
    }

    async fn handle_page(&self, page: &Page) {
        let ctx = &self.context;
        let analysis = ctx.extractor.analyze(&page.html);

        match analysis.extraction {
            Some(Ok(extraction)) => {
                for rejected in &extraction.rejected {
                    tracing::warn!("Worker {}: {} on {}", self.id, rejected, page.url);
                }
                if extraction.aborted(ctx.extractor.policy()) {
                    tracing::warn!(
                        "Worker {}: stopped extracting {} after {} record(s)",
                        self.id,
                        page.url,
                        extraction.records.len()
                    );
                }
                for record in &extraction.records {
                    self.commit(record).await;
                }
            }
            Some(Err(e)) => {
                tracing::warn!("Worker {}: {} on {}", self.id, e, page.url);
            }
            None => {}
        }

        let mut seen = HashSet::new();
        for href in &analysis.links {
            let Some(link) = ctx.canonicalizer.canonicalize(href, &page.url) else {
                continue;
            };
            if !seen.insert(link.clone()) {
                continue;
            }
            self.enqueue_link(&link).await;
        }
    }

    async fn commit(&self, record: &Record) {
        let ctx = &self.context;
        match ctx.records.commit(record).await {
            Ok(CommitOutcome::Inserted) => {
                bump(&ctx.stats.records_committed);
                tracing::info!(
                    "Worker {}: stored [{}] {}: {}",
                    self.id,
                    record.kind,
                    record.title,
                    record.body
                );
            }
            Ok(CommitOutcome::Duplicate) => {
                bump(&ctx.stats.records_duplicate);
                tracing::debug!("Worker {}: duplicate record {}", self.id, record.id);
            }
            Err(e) => {
                tracing::warn!("Worker {}: could not store record {}: {}", self.id, record.id, e);
            }
        }
    }

    /// Enqueues `link` unless it is known to be visited
    ///
    /// A failed visited check still enqueues; the consumer re-checks anyway.
    async fn enqueue_link(&self, link: &str) {
        let ctx = &self.context;
        match ctx.frontier.is_visited(link).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => tracing::debug!("Worker {}: visited check failed for {}: {}", self.id, link, e),
        }

        match ctx.frontier.enqueue(link).await {
            Ok(()) => bump(&ctx.stats.links_enqueued),
            Err(e) => tracing::warn!("Worker {}: could not enqueue {}: {}", self.id, link, e),
        }
    }
}
