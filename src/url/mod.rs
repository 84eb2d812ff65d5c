//! URL handling module for Motto-Harvest
//!
//! This module provides link canonicalization and site-scope filtering.

mod canonicalize;
mod domain;

pub use canonicalize::{is_pagination_link, Canonicalizer};
pub use domain::netloc;
