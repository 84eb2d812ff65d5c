//! Integration tests for Motto-Harvest
//!
//! These tests use wiremock to serve a miniature quote site and drive the
//! fetcher and the full crawl cycle against it.

mod common;
mod crawl_tests;
mod fetch_tests;
