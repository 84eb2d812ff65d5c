use crate::config::types::{Config, CrawlerConfig, OutputConfig, RetryConfig, SiteConfig};
use crate::url::netloc;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site section: the root URL must live on the configured domain
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_netloc(&config.domain)?;

    let root = Url::parse(&config.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url: {}", e)))?;

    if root.scheme() != "http" && root.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "root-url '{}' must use http or https",
            config.root_url
        )));
    }

    let root_netloc = netloc(&root).unwrap_or_default();
    if !root_netloc.eq_ignore_ascii_case(&config.domain) {
        return Err(ConfigError::Validation(format!(
            "root-url host '{}' does not match site domain '{}'",
            root_netloc, config.domain
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.charsets.is_empty() {
        return Err(ConfigError::Validation(
            "charsets must list at least one encoding".to_string(),
        ));
    }

    if config.idle_backoff_ms == 0 {
        return Err(ConfigError::Validation(
            "idle-backoff-ms must be > 0 so an empty queue is never polled in a tight loop"
                .to_string(),
        ));
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "poll-interval-ms must be > 0".to_string(),
        ));
    }

    if config.quiet_polls < 1 {
        return Err(ConfigError::Validation(format!(
            "quiet-polls must be >= 1, got {}",
            config.quiet_polls
        )));
    }

    Ok(())
}

/// Validates retry bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.network_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "network-attempts must be >= 1, got {}",
            config.network_attempts
        )));
    }

    if config.storage_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "storage-attempts must be >= 1, got {}",
            config.storage_attempts
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.queue_name.is_empty() || config.visited_set.is_empty() {
        return Err(ConfigError::Validation(
            "queue-name and visited-set cannot be empty".to_string(),
        ));
    }

    if config.queue_name == config.visited_set {
        return Err(ConfigError::Validation(format!(
            "queue-name and visited-set must differ, both are '{}'",
            config.queue_name
        )));
    }

    Ok(())
}

/// Validates a host with an optional port (e.g. `www.example.com`, `127.0.0.1:8080`)
fn validate_netloc(netloc: &str) -> Result<(), ConfigError> {
    if netloc.is_empty() {
        return Err(ConfigError::Validation(
            "site domain cannot be empty".to_string(),
        ));
    }

    let (host, port) = match netloc.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (netloc, None),
    };

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            netloc
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' has misplaced dots",
            netloc
        )));
    }

    if let Some(port) = port {
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Domain '{}' has an invalid port",
                netloc
            )));
        }
    }

    Ok(())
}
