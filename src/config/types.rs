use crate::crawler::{Charset, MalformedParagraphPolicy};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Motto-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// The single site being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Network location of the site (host, optionally with a port)
    pub domain: String,

    /// URL used to seed an empty frontier
    #[serde(rename = "root-url")]
    pub root_url: String,
}

/// Worker pool and page handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Value of the User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Candidate encodings, tried in order when decoding a page body
    #[serde(default = "default_charsets")]
    pub charsets: Vec<Charset>,

    /// Sleep between dequeue attempts on an empty queue (milliseconds)
    #[serde(rename = "idle-backoff-ms", default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,

    /// Interval between termination checks (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Consecutive quiet polls required before the crawl is declared done
    #[serde(rename = "quiet-polls", default = "default_quiet_polls")]
    pub quiet_polls: u32,

    /// What to do with a detail-page paragraph lacking the numbering delimiter
    #[serde(rename = "malformed-paragraph", default)]
    pub malformed_paragraph: MalformedParagraphPolicy,
}

impl CrawlerConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_millis(self.idle_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Retry bounds for transient failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts for network operations
    #[serde(rename = "network-attempts", default = "default_network_attempts")]
    pub network_attempts: u32,

    /// Attempts for queue and document store operations
    #[serde(rename = "storage-attempts", default = "default_storage_attempts")]
    pub storage_attempts: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "delay-ms", default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            network_attempts: default_network_attempts(),
            storage_attempts: default_storage_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Name of the pending URL queue
    #[serde(rename = "queue-name", default = "default_queue_name")]
    pub queue_name: String,

    /// Name of the visited URL set
    #[serde(rename = "visited-set", default = "default_visited_set")]
    pub visited_set: String,
}

fn default_workers() -> u32 {
    10
}

fn default_charsets() -> Vec<Charset> {
    vec![Charset::Gb2312, Charset::Utf8, Charset::Gbk]
}

fn default_idle_backoff_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_quiet_polls() -> u32 {
    3
}

fn default_network_attempts() -> u32 {
    5
}

fn default_storage_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_queue_name() -> String {
    "geyanw_task".to_string()
}

fn default_visited_set() -> String {
    "visited_urls".to_string()
}
