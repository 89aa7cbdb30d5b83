//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and authenticated sessions
//! - HTML parsing and link extraction
//! - Image capture
//! - The breadth-first crawl engine and its progress reporting

mod engine;
mod fetcher;
mod images;
mod parser;
mod progress;


pub use engine::{CrawlReport, Engine, EngineSettings};
pub use fetcher::{build_http_client, Credentials, Fetcher, HttpFetcher};
pub use images::{image_extension, image_file_name, ImageDecision, ImageFilter};
pub use parser::{parse_html, HtmlPageParser, Link, PageParser, ParsedPage};
pub use progress::{ChannelProgress, ProgressSink, TracingProgress};

use crate::config::Config;
use crate::storage::{PageStore, SqlitePageStore};
use crate::TrawlError;
use std::path::Path;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the page store and make sure the schema exists
/// 2. Build the HTTP fetcher, logging in when auth is configured
/// 3. Seed the store with the configured URLs
/// 4. Record a new run and crawl for `config.crawler.max_depth` rounds
/// 5. Close the run with its final status and totals
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, stored on the run
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished
/// * `Err(TrawlError)` - Login or persistence failed
pub async fn run_crawl(config: &Config, config_hash: &str) -> Result<CrawlReport, TrawlError> {
    let mut store = SqlitePageStore::new(Path::new(&config.output.database_path))?;
    store.ensure_schema()?;

    let fetcher = HttpFetcher::new(&config.user_agent, config.crawler.request_timeout)?;

    let mut engine = Engine::new(store, fetcher, HtmlPageParser)
        .with_settings(EngineSettings::from(&config.crawler));

    if let Some(images) = config.active_images() {
        tracing::info!("Image capture enabled, saving to {}", images.media_dir);
        engine = engine.with_image_filter(ImageFilter::from(images));
    }

    if let Some(auth) = config.active_auth() {
        engine
            .login(&Credentials::from(auth), &auth.login_endpoint)
            .await?;
    }

    engine.seed(&config.seeds)?;

    engine
        .run_recorded(config_hash, config.crawler.max_depth)
        .await
}
