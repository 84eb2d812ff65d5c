//! Bounded retry with a fixed backoff
//!
//! | Operation class | Attempts | Delay |
//! |-----------------|----------|-------|
//! | Network (fetch) | 5        | 3 s   |
//! | Queue / records | 3        | 3 s   |
//!
//! Only errors that report themselves as transient are retried. Anything
//! else is returned on the first failure. When attempts run out the last
//! error is returned to the caller.

use crate::config::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Classifies an error as worth retrying
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// A retry bound and fixed delay, applied to any fallible operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
    cancel: Option<CancellationToken>,
}

impl RetryPolicy {
    /// Creates a policy making at most `attempts` tries, `delay` apart
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            cancel: None,
        }
    }

    /// Policy for network operations
    pub fn network(config: &RetryConfig) -> Self {
        Self::new(config.network_attempts, config.delay())
    }

    /// Policy for queue and document store operations
    pub fn storage(config: &RetryConfig) -> Self {
        Self::new(config.storage_attempts, config.delay())
    }

    /// Stops waiting between attempts once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs an async operation under this policy
    ///
    /// `what` names the operation in log output.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.attempts => {
                    tracing::warn!("{} failed after {} attempts: {}", what, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt,
                        self.attempts,
                        e,
                        self.delay
                    );
                    if !self.backoff().await {
                        tracing::debug!("{} abandoned: shutdown requested", what);
                        return Err(e);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Runs a blocking operation under this policy
    pub async fn run_sync<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Transient + fmt::Display,
    {
        self.run(what, || std::future::ready(op())).await
    }

    /// Sleeps for the backoff delay; returns false if cancelled meanwhile
    async fn backoff(&self) -> bool {
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => false,
                _ = tokio::time::sleep(self.delay) => true,
            },
            None => {
                tokio::time::sleep(self.delay).await;
                true
            }
        }
    }
}
