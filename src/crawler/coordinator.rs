//! Crawler coordinator - worker pool orchestration
//!
//! This module wires the crawl together:
//! - Building the shared frontier, fetcher, extractor and record store
//! - Seeding the frontier once with the site root
//! - Spawning the worker pool
//! - Detecting completion and shutting the pool down
//!
//! # Termination
//!
//! The crawl is declared finished once the queue is empty, no URL is in
//! flight and every worker is idle, for `quiet-polls` consecutive polls.
//! The three values are read one after another rather than atomically, so
//! this is a heuristic: a worker may enqueue links between two reads. The
//! in-flight count and the repeated polls make a premature stop unlikely,
//! not impossible.

use crate::config::Config;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::retry::RetryPolicy;
use crate::crawler::worker::{CrawlContext, CrawlStats, CrawlSummary, Worker};
use crate::state::WorkerStatus;
use crate::storage::{RecordStore, SqliteStorage};
use crate::url::Canonicalizer;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the worker pool for one crawl
pub struct Coordinator {
    config: Arc<Config>,
    context: Arc<CrawlContext>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator over an opened storage
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Backs both the frontier and the record store
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client, selectors or site domain were invalid
    pub fn new(config: Config, storage: Arc<SqliteStorage>) -> Result<Self> {
        let cancel = CancellationToken::new();
        let network_retry = RetryPolicy::network(&config.retry).with_cancellation(cancel.clone());
        let storage_retry = RetryPolicy::storage(&config.retry).with_cancellation(cancel.clone());

        let context = CrawlContext {
            frontier: Frontier::from_config(storage.clone(), &config, storage_retry.clone()),
            fetcher: Fetcher::from_config(&config.crawler, network_retry)?,
            extractor: Extractor::new(config.crawler.malformed_paragraph)?,
            canonicalizer: Canonicalizer::new(&config.site.domain)?,
            records: RecordStore::new(storage, storage_retry),
            stats: CrawlStats::default(),
        };

        Ok(Self {
            config: Arc::new(config),
            context: Arc::new(context),
            cancel,
        })
    }

    /// Token that stops the crawl when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.context.frontier
    }

    /// Counters so far; final once `run` has returned
    pub fn summary(&self) -> CrawlSummary {
        self.context.stats.summary()
    }

    /// Clears the queue and the visited set; stored records are kept
    pub async fn reset(&self) -> Result<()> {
        tracing::info!("Clearing pending queue and visited set");
        self.context.frontier.reset().await?;
        Ok(())
    }

    /// Runs the crawl until the termination heuristic fires or the token is cancelled
    pub async fn run(&self) -> Result<CrawlSummary> {
        let frontier = &self.context.frontier;
        let root_url = self.config.site.root_url.as_str();

        if frontier.seed_if_empty(root_url).await? {
            tracing::info!("Seeded frontier with {}", root_url);
        } else {
            tracing::info!(
                "Resuming with {} pending URL(s)",
                frontier.pending_count().await?
            );
        }

        let worker_count = self.config.crawler.workers as usize;
        tracing::info!("Starting {} workers", worker_count);

        let statuses: Vec<Arc<WorkerStatus>> = (0..worker_count)
            .map(|_| Arc::new(WorkerStatus::new()))
            .collect();

        let handles: Vec<_> = statuses
            .iter()
            .enumerate()
            .map(|(id, status)| {
                let worker = Worker::new(
                    id,
                    Arc::clone(&self.context),
                    Arc::clone(status),
                    self.cancel.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();

        self.wait_for_completion(&statuses).await;
        self.cancel.cancel();

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let summary = self.summary();
        tracing::info!(
            "Crawl finished: {} fetched, {} failed, {} skipped, {} records stored ({} duplicate), {} links enqueued, {} requeued",
            summary.pages_fetched,
            summary.pages_failed,
            summary.pages_skipped,
            summary.records_committed,
            summary.records_duplicate,
            summary.links_enqueued,
            summary.pages_requeued
        );

        Ok(summary)
    }

    /// Polls until the crawl looks finished or the token is cancelled
    async fn wait_for_completion(&self, statuses: &[Arc<WorkerStatus>]) {
        let frontier = &self.context.frontier;
        let quiet_polls = self.config.crawler.quiet_polls;
        let mut quiet = 0;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Shutdown requested, stopping workers");
                    return;
                }
                _ = tokio::time::sleep(self.config.crawler.poll_interval()) => {}
            }

            let in_flight = frontier.in_flight();
            let all_idle = statuses.iter().all(|status| status.is_idle());
            let pending = match frontier.pending_count().await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::warn!("Could not read queue length: {}", e);
                    quiet = 0;
                    continue;
                }
            };

            if pending == 0 && in_flight == 0 && all_idle {
                quiet += 1;
                tracing::debug!("Frontier quiet ({}/{})", quiet, quiet_polls);
                if quiet >= quiet_polls {
                    tracing::info!("Frontier drained and all workers idle");
                    return;
                }
            } else {
                quiet = 0;
                tracing::debug!("{} pending, {} in flight", pending, in_flight);
            }
        }
    }
}

/// Opens storage, optionally resets the frontier, and runs a crawl
///
/// Ctrl-C cancels the crawl; counters gathered up to that point are returned.
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlSummary> {
    let storage = Arc::new(SqliteStorage::new(Path::new(&config.output.database_path))?);
    let coordinator = Coordinator::new(config, storage)?;

    if fresh {
        coordinator.reset().await?;
    }

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received");
            cancel.cancel();
        }
    });

    coordinator.run().await
}
