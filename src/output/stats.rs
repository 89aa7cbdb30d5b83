//! Statistics generation from the page store
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{PageStore, RunRecord};
use crate::TrawlError;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of URLs discovered
    pub total: u64,

    /// URLs fetched and parsed
    pub crawled: u64,

    /// URLs still waiting in the frontier
    pub uncrawled: u64,

    /// Uncrawled URLs that hit the retry ceiling (0 when no ceiling is set)
    pub exhausted: u64,

    /// Depth -> number of URLs at that depth
    pub depth_breakdown: BTreeMap<u32, u64>,

    /// Most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Share of discovered URLs that have been crawled, in percent
    pub fn crawled_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.crawled as f64 / self.total as f64) * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The page store to query
/// * `max_attempts` - Retry ceiling used to count exhausted URLs, `None` for no ceiling
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(TrawlError)` - Failed to query statistics
pub fn load_statistics(
    store: &dyn PageStore,
    max_attempts: Option<u32>,
) -> Result<CrawlStatistics, TrawlError> {
    let exhausted = match max_attempts {
        Some(max) => store.count_exhausted(max)?,
        None => 0,
    };

    Ok(CrawlStatistics {
        total: store.count_total()?,
        crawled: store.count_by_crawled(true)?,
        uncrawled: store.count_by_crawled(false)?,
        exhausted,
        depth_breakdown: store.depth_breakdown()?,
        latest_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total URLs discovered: {}", stats.total);
    println!(
        "  Crawled: {} ({:.1}%)",
        stats.crawled,
        stats.crawled_percentage()
    );
    println!("  Uncrawled: {}", stats.uncrawled);
    if stats.exhausted > 0 {
        println!("  Given up after repeated failures: {}", stats.exhausted);
    }
    println!();

    if !stats.depth_breakdown.is_empty() {
        println!("URLs by Depth:");
        for (depth, count) in &stats.depth_breakdown {
            println!("  {}: {}", depth, count);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  Id: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Rounds: {} (max depth {})", run.rounds, run.max_depth);
            println!("  Pages crawled: {}", run.pages_crawled);
        }
        None => println!("No crawl runs recorded"),
    }
}
