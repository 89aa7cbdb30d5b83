//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PageStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PageStore, StorageError, StorageResult};
use crate::storage::{NewUrlRecord, RunRecord, RunStatus, UrlRecord};
use crate::TrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const URL_COLUMNS: &str = "id, url, title, body, depth, linked_from, crawled, fetch_attempts,
     discovered_at, crawled_at";

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, max_depth, rounds, pages_crawled, status";

/// SQLite page store backend
pub struct SqlitePageStore {
    conn: Connection,
}

impl SqlitePageStore {
    /// Opens or creates the database at `path` and ensures the schema
    pub fn new(path: &Path) -> Result<Self, TrawlError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, TrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn url_from_row(row: &Row<'_>) -> rusqlite::Result<UrlRecord> {
    Ok(UrlRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        depth: row.get(4)?,
        linked_from: row.get(5)?,
        crawled: row.get(6)?,
        fetch_attempts: row.get(7)?,
        discovered_at: row.get(8)?,
        crawled_at: row.get(9)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        max_depth: row.get(4)?,
        rounds: row.get(5)?,
        pages_crawled: row.get::<_, i64>(6)? as u64,
        status: RunStatus::from_db_string(&row.get::<_, String>(7)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl PageStore for SqlitePageStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    // ===== Frontier =====

    fn next_batch(
        &self,
        limit: Option<u32>,
        max_attempts: Option<u32>,
    ) -> StorageResult<Vec<UrlRecord>> {
        let sql = format!(
            "SELECT {} FROM urls
             WHERE crawled = 0 AND (?1 IS NULL OR fetch_attempts < ?1)
             ORDER BY depth ASC, id ASC
             LIMIT ?2",
            URL_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);

        let records = stmt
            .query_map(params![max_attempts, limit], url_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== URL Records =====

    fn exists(&self, url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM urls WHERE url = ?1", params![url], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<UrlRecord>> {
        let sql = format!("SELECT {} FROM urls WHERE url = ?1", URL_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![url], url_from_row)
            .optional()?;
        Ok(record)
    }

    fn get(&self, id: i64) -> StorageResult<UrlRecord> {
        let sql = format!("SELECT {} FROM urls WHERE id = ?1", URL_COLUMNS);
        self.conn
            .query_row(&sql, params![id], url_from_row)
            .optional()?
            .ok_or_else(|| StorageError::UrlNotFound(format!("URL ID {}", id)))
    }

    fn insert(&mut self, record: &NewUrlRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO urls (url, title, depth, linked_from, crawled, discovered_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![
                    record.url,
                    record.title,
                    record.depth,
                    record.linked_from,
                    now
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StorageError::ConstraintViolation(format!(
                        "URL already stored: {}",
                        record.url
                    ))
                } else {
                    StorageError::Sqlite(e)
                }
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, record: &UrlRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE urls SET title = ?1, body = ?2, depth = ?3, linked_from = ?4,
             crawled = MAX(crawled, ?5),
             crawled_at = CASE WHEN ?5 = 1 AND crawled_at IS NULL THEN ?6 ELSE crawled_at END
             WHERE url = ?7",
            params![
                record.title,
                record.body,
                record.depth,
                record.linked_from,
                record.crawled,
                now,
                record.url
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::UrlNotFound(record.url.clone()));
        }
        Ok(())
    }

    fn record_fetch_failure(&mut self, url: &str) -> StorageResult<u32> {
        let attempts: Option<u32> = self
            .conn
            .query_row(
                "UPDATE urls SET fetch_attempts = fetch_attempts + 1 WHERE url = ?1
                 RETURNING fetch_attempts",
                params![url],
                |row| row.get(0),
            )
            .optional()?;

        attempts.ok_or_else(|| StorageError::UrlNotFound(url.to_string()))
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, max_depth: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, max_depth, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, max_depth, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        rounds: u32,
        pages_crawled: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, rounds = ?3, pages_crawled = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                rounds,
                pages_crawled as i64,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_total(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM urls", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_crawled(&self, crawled: bool) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE crawled = ?1",
            params![crawled],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_exhausted(&self, max_attempts: u32) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM urls WHERE crawled = 0 AND fetch_attempts >= ?1",
            params![max_attempts],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn depth_breakdown(&self) -> StorageResult<BTreeMap<u32, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT depth, COUNT(*) FROM urls GROUP BY depth ORDER BY depth")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut breakdown = BTreeMap::new();
        for row in rows {
            let (depth, count) = row?;
            breakdown.insert(depth, count);
        }

        Ok(breakdown)
    }
}
