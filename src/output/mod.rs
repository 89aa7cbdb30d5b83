//! Output module for reporting on the page store
//!
//! This module handles:
//! - Loading crawl statistics from storage
//! - Printing them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
