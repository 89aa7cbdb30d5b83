//! Storage module for persisting the link graph
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - URL records with their crawl state, depth and referrer
//! - Frontier batch queries
//! - Run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqlitePageStore;
pub use traits::{PageStore, StorageError, StorageResult};

use crate::TrawlError;

use std::path::Path;

/// Opens (and creates if needed) a page store database
pub fn open_storage(path: &Path) -> Result<SqlitePageStore, TrawlError> {
    SqlitePageStore::new(path)
}

/// One discovered URL and its crawl state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Depth at which the record was last written, 0 for seeds
    pub depth: u32,
    /// Id of the page that most recently linked here
    pub linked_from: Option<i64>,
    pub crawled: bool,
    pub fetch_attempts: u32,
    pub discovered_at: String,
    pub crawled_at: Option<String>,
}

/// Fields supplied when a URL is first discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub url: String,
    pub title: Option<String>,
    pub depth: u32,
    pub linked_from: Option<i64>,
}

impl NewUrlRecord {
    /// A seed: depth 0 with no referrer
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            depth: 0,
            linked_from: None,
        }
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub max_depth: u32,
    pub rounds: u32,
    pub pages_crawled: u64,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
