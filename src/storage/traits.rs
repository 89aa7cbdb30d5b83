//! Storage traits and error types
//!
//! This module defines the trait interface the crawl engine uses to reach its
//! page store, and the associated error types.

use crate::storage::{NewUrlRecord, RunRecord, RunStatus, UrlRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("URL not found: {0}")]
    UrlNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable table of discovered URLs with crawl state
///
/// The store is the single source of truth for crawl state. The engine never
/// caches dedup decisions and re-reads everything it needs each round.
pub trait PageStore {
    /// Creates tables and indexes if missing. Safe to call repeatedly.
    fn ensure_schema(&mut self) -> StorageResult<()>;

    // ===== Frontier =====

    /// Returns uncrawled records due for the next round
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum number of records, `None` for all
    /// * `max_attempts` - Excludes records that already failed this many
    ///   fetches, `None` to ignore attempt counts
    fn next_batch(
        &self,
        limit: Option<u32>,
        max_attempts: Option<u32>,
    ) -> StorageResult<Vec<UrlRecord>>;

    // ===== URL Records =====

    /// Exact-string lookup of a URL
    fn exists(&self, url: &str) -> StorageResult<bool>;

    fn get_by_url(&self, url: &str) -> StorageResult<Option<UrlRecord>>;

    fn get(&self, id: i64) -> StorageResult<UrlRecord>;

    /// Inserts a newly discovered URL as uncrawled and returns its id
    ///
    /// Fails with `ConstraintViolation` if the URL is already stored.
    fn insert(&mut self, record: &NewUrlRecord) -> StorageResult<i64>;

    /// Writes title, body, depth, referrer and crawled flag for `record.url`
    ///
    /// A record that is already crawled stays crawled.
    fn update(&mut self, record: &UrlRecord) -> StorageResult<()>;

    /// Bumps the failed-fetch counter and returns the new count
    fn record_fetch_failure(&mut self, url: &str) -> StorageResult<u32>;

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, max_depth: u32) -> StorageResult<i64>;

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and totals
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        rounds: u32,
        pages_crawled: u64,
    ) -> StorageResult<()>;

    // ===== Statistics =====

    fn count_total(&self) -> StorageResult<u64>;

    fn count_by_crawled(&self, crawled: bool) -> StorageResult<u64>;

    /// Uncrawled records whose attempts reached `max_attempts`
    fn count_exhausted(&self, max_attempts: u32) -> StorageResult<u64>;

    /// Depth -> number of records at that depth
    fn depth_breakdown(&self) -> StorageResult<BTreeMap<u32, u64>>;
}
