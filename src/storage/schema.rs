//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Trawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    max_depth INTEGER NOT NULL DEFAULT 0,
    rounds INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL
);

-- One row per distinct URL ever discovered
CREATE TABLE IF NOT EXISTS urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT,
    body TEXT,
    depth INTEGER NOT NULL DEFAULT 0,
    linked_from INTEGER REFERENCES urls(id),
    crawled INTEGER NOT NULL DEFAULT 0,
    fetch_attempts INTEGER NOT NULL DEFAULT 0,
    discovered_at TEXT NOT NULL,
    crawled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_urls_crawled ON urls(crawled, depth);
CREATE INDEX IF NOT EXISTS idx_urls_linked_from ON urls(linked_from);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
