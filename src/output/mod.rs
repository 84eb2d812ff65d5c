//! Output module for reporting on crawl results
//!
//! This module handles:
//! - Loading record and frontier counts from storage
//! - Rendering them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
