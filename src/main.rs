//! Motto-Harvest main entry point
//!
//! This is the command-line interface for the Motto-Harvest quote crawler.

use clap::Parser;
use motto_harvest::config::{load_config_with_hash, Config};
use motto_harvest::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Motto-Harvest: a single-site quote crawler
///
/// Motto-Harvest follows the links of one site, extracts quote records from
/// its detail pages and stores every distinct quote once. An interrupted
/// crawl resumes from its saved queue on the next start.
#[derive(Parser, Debug)]
#[command(name = "motto-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A single-site quote crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Clear the pending queue and visited set before crawling (records are kept)
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("motto_harvest=info,warn"),
            1 => EnvFilter::new("motto_harvest=debug,info"),
            2 => EnvFilter::new("motto_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Motto-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", config.site.domain);
    println!("  Root URL: {}", config.site.root_url);

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  User agent: {}", config.crawler.user_agent);
    let charsets: Vec<_> = config.crawler.charsets.iter().map(|c| c.name()).collect();
    println!("  Charsets: {}", charsets.join(", "));
    println!("  Idle backoff: {}ms", config.crawler.idle_backoff_ms);
    println!(
        "  Termination: {} quiet polls, {}ms apart",
        config.crawler.quiet_polls, config.crawler.poll_interval_ms
    );
    println!(
        "  Malformed paragraphs: {:?}",
        config.crawler.malformed_paragraph
    );

    println!("\nRetry:");
    println!("  Network attempts: {}", config.retry.network_attempts);
    println!("  Storage attempts: {}", config.retry.storage_attempts);
    println!("  Delay: {}ms", config.retry.delay_ms);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Queue: {}", config.output.queue_name);
    println!("  Visited set: {}", config.output.visited_set);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use motto_harvest::output::{load_statistics, print_statistics};
    use motto_harvest::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage, &config.output)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh crawl (pending queue and visited set cleared)");
    } else {
        tracing::info!("Starting crawl (will resume from a saved queue if present)");
    }

    tracing::info!(
        "Site: {}, workers: {}",
        config.site.domain,
        config.crawler.workers
    );

    match crawl(config, fresh).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} new record(s) from {} page(s)",
                summary.records_committed,
                summary.pages_fetched
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
