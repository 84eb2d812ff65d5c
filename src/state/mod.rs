//! State module for crawl data and worker progress
//!
//! # Components
//!
//! - `Record`: a content-addressed quote extracted from a detail page
//! - `WorkerState` / `WorkerStatus`: per-worker idle/working flag read by the coordinator

mod record;
mod worker_state;

// Re-export main types
pub use record::{content_id, Record};
pub use worker_state::{WorkerState, WorkerStatus};
