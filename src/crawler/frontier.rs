//! Frontier: the pending URL queue and the visited URL set
//!
//! Every operation touches a single URL and is atomic in the underlying
//! store. Nothing here makes a check-then-act sequence atomic; callers must
//! tolerate two workers racing on the same URL.
//!
//! The frontier also counts URLs in flight. The count is raised before each
//! pop attempt and lowered when the returned [`Lease`] is dropped, which the
//! worker does only after marking the URL visited.

use crate::config::Config;
use crate::crawler::retry::RetryPolicy;
use crate::storage::{QueueStore, StorageResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared pending queue and visited set
pub struct Frontier {
    store: Arc<dyn QueueStore>,
    queue: String,
    visited: String,
    retry: RetryPolicy,
    idle_backoff: Duration,
    in_flight: AtomicUsize,
}

/// Decrements the in-flight count when dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn acquire(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A dequeued URL, counted as in flight until dropped
pub struct Lease<'a> {
    url: String,
    _in_flight: InFlight<'a>,
}

impl Lease<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Frontier {
    pub fn new(
        store: Arc<dyn QueueStore>,
        queue: impl Into<String>,
        visited: impl Into<String>,
        retry: RetryPolicy,
        idle_backoff: Duration,
    ) -> Self {
        Self {
            store,
            queue: queue.into(),
            visited: visited.into(),
            retry,
            idle_backoff,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Builds a frontier over the queue and set named in `config`
    pub fn from_config(store: Arc<dyn QueueStore>, config: &Config, retry: RetryPolicy) -> Self {
        Self::new(
            store,
            config.output.queue_name.as_str(),
            config.output.visited_set.as_str(),
            retry,
            config.crawler.idle_backoff(),
        )
    }

    /// Pushes `url` only if the queue holds nothing yet
    ///
    /// Returns true if the seed was pushed. A restarted crawl with work left
    /// in its queue resumes from that work instead of the root.
    pub async fn seed_if_empty(&self, url: &str) -> StorageResult<bool> {
        let store = &self.store;
        let queue = self.queue.as_str();

        if self
            .retry
            .run_sync("queue check", || store.queue_exists(queue))
            .await?
        {
            return Ok(false);
        }

        self.enqueue(url).await?;
        Ok(true)
    }

    /// Appends `url` to the queue, whether or not it is already queued or visited
    pub async fn enqueue(&self, url: &str) -> StorageResult<()> {
        let store = &self.store;
        let queue = self.queue.as_str();
        self.retry
            .run_sync("enqueue", || store.push_back(queue, url))
            .await
    }

    /// Pops the next URL, sleeping between attempts while the queue is empty
    ///
    /// Returns `None` only once `cancel` fires. Store failures that survive
    /// retrying are logged and treated like an empty queue.
    pub async fn dequeue_blocking(&self, cancel: &CancellationToken) -> Option<Lease<'_>> {
        let store = &self.store;
        let queue = self.queue.as_str();

        loop {
            if cancel.is_cancelled() {
                return None;
            }

            let in_flight = InFlight::acquire(&self.in_flight);
            match self
                .retry
                .run_sync("dequeue", || store.pop_front(queue))
                .await
            {
                Ok(Some(url)) => {
                    return Some(Lease {
                        url,
                        _in_flight: in_flight,
                    })
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Dequeue from {} failed: {}", self.queue, e),
            }
            drop(in_flight);

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.idle_backoff) => {}
            }
        }
    }

    pub async fn is_visited(&self, url: &str) -> StorageResult<bool> {
        let store = &self.store;
        let visited = self.visited.as_str();
        self.retry
            .run_sync("visited check", || store.set_contains(visited, url))
            .await
    }

    /// Records `url` as processed; idempotent
    ///
    /// Returns true if the URL was not marked before.
    pub async fn mark_visited(&self, url: &str) -> StorageResult<bool> {
        let store = &self.store;
        let visited = self.visited.as_str();
        self.retry
            .run_sync("mark visited", || store.set_add(visited, url))
            .await
    }

    /// Approximate queue length; only meaningful for termination checks
    pub async fn pending_count(&self) -> StorageResult<u64> {
        let store = &self.store;
        let queue = self.queue.as_str();
        self.retry
            .run_sync("queue length", || store.queue_len(queue))
            .await
    }

    pub async fn visited_count(&self) -> StorageResult<u64> {
        let store = &self.store;
        let visited = self.visited.as_str();
        self.retry
            .run_sync("visited count", || store.set_len(visited))
            .await
    }

    /// Number of workers currently holding or trying to obtain a lease
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Empties both the queue and the visited set
    pub async fn reset(&self) -> StorageResult<()> {
        let store = &self.store;
        let (queue, visited) = (self.queue.as_str(), self.visited.as_str());
        self.retry
            .run_sync("clear queue", || store.clear_queue(queue))
            .await?;
        self.retry
            .run_sync("clear visited", || store.clear_set(visited))
            .await
    }
}
