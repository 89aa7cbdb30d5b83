//! Crawl engine - breadth-first traversal over the page store
//!
//! Each round loads every uncrawled record into the frontier, processes the
//! pages one at a time (fetch, parse, capture images, record links, mark
//! crawled) and then reloads. Rounds stop when the frontier comes back empty
//! or the round budget is spent.
//!
//! Link writes use last-writer-wins semantics: rediscovering a known URL
//! overwrites its title, referrer and depth, even when the new depth is
//! larger than the stored one.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Credentials, Fetcher};
use crate::crawler::images::{ImageDecision, ImageFilter};
use crate::crawler::parser::{Link, PageParser, ParsedPage};
use crate::crawler::progress::{ProgressSink, TracingProgress};
use crate::storage::{NewUrlRecord, PageStore, RunStatus, StorageError, UrlRecord};
use crate::TrawlError;
use std::collections::VecDeque;
use std::time::Instant;

/// Frontier sizing and retry limits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum records per frontier, `None` for all uncrawled records
    pub batch_size: Option<u32>,

    /// Failed fetches after which a record is left out of the frontier,
    /// `None` to retry forever
    pub max_fetch_attempts: Option<u32>,
}

impl From<&CrawlerConfig> for EngineSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            batch_size: Some(config.batch_size).filter(|&n| n > 0),
            max_fetch_attempts: Some(config.max_fetch_attempts).filter(|&n| n > 0),
        }
    }
}

/// Totals for one call to [`Engine::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Completed frontier rounds
    pub rounds: u32,
    pub pages_crawled: u64,
    pub fetch_failures: u64,
    /// Links that created a new record
    pub links_inserted: u64,
    /// Links that rewrote an existing record
    pub links_updated: u64,
    pub images_saved: u64,
}

/// Drives the fetch, parse, classify, persist pipeline
pub struct Engine<S, F, P> {
    store: S,
    fetcher: F,
    parser: P,
    settings: EngineSettings,
    images: Option<ImageFilter>,
    progress: Box<dyn ProgressSink>,
}

impl<S, F, P> Engine<S, F, P>
where
    S: PageStore,
    F: Fetcher,
    P: PageParser,
{
    pub fn new(store: S, fetcher: F, parser: P) -> Self {
        Self {
            store,
            fetcher,
            parser,
            settings: EngineSettings::default(),
            images: None,
            progress: Box::new(TracingProgress),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enables image capture through `filter`
    pub fn with_image_filter(mut self, filter: ImageFilter) -> Self {
        self.images = Some(filter);
        self
    }

    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Logs the fetcher in before any page is requested
    pub async fn login(&self, credentials: &Credentials, endpoint: &str) -> Result<(), TrawlError> {
        self.fetcher
            .start_authenticated_session(credentials, endpoint)
            .await
    }

    /// Inserts seed URLs at depth 0 unless the store already knows them
    ///
    /// Returns the number of URLs actually inserted.
    pub fn seed(&mut self, urls: &[String]) -> Result<usize, TrawlError> {
        let mut inserted = 0;
        for url in urls {
            if self.store.exists(url)? {
                tracing::debug!("Seed already known: {}", url);
                continue;
            }
            self.store.insert(&NewUrlRecord::seed(url.as_str()))?;
            inserted += 1;
        }
        if inserted > 0 {
            tracing::info!("Seeded {} new URLs", inserted);
        }
        Ok(inserted)
    }

    /// Reads the next frontier from the store
    pub fn load_frontier(&self) -> Result<VecDeque<UrlRecord>, TrawlError> {
        let batch = self
            .store
            .next_batch(self.settings.batch_size, self.settings.max_fetch_attempts)?;
        Ok(batch.into())
    }

    /// Crawls until the frontier is empty or `max_depth` rounds have run
    ///
    /// `max_depth == 0` means no round limit. Fetch and parse failures only
    /// cost the page in question; any storage failure aborts the run.
    pub async fn run(&mut self, max_depth: u32) -> Result<CrawlReport, TrawlError> {
        let mut report = CrawlReport::default();
        self.run_into(max_depth, &mut report).await?;
        Ok(report)
    }

    /// Runs a crawl and records it in the run ledger
    ///
    /// The run is closed as completed, or as failed with the totals reached
    /// before the error, which is then returned.
    pub async fn run_recorded(
        &mut self,
        config_hash: &str,
        max_depth: u32,
    ) -> Result<CrawlReport, TrawlError> {
        let run_id = self.store.create_run(config_hash, max_depth)?;
        tracing::info!("Starting crawl run {} (max depth {})", run_id, max_depth);

        let mut report = CrawlReport::default();
        match self.run_into(max_depth, &mut report).await {
            Ok(()) => {
                self.store.finish_run(
                    run_id,
                    RunStatus::Completed,
                    report.rounds,
                    report.pages_crawled,
                )?;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(
                    "Crawl run {} failed after {} pages: {}",
                    run_id,
                    report.pages_crawled,
                    e
                );
                if let Err(finish_err) = self.store.finish_run(
                    run_id,
                    RunStatus::Failed,
                    report.rounds,
                    report.pages_crawled,
                ) {
                    tracing::warn!("Could not mark run {} as failed: {}", run_id, finish_err);
                }
                Err(e)
            }
        }
    }

    /// Round loop; `report` holds partial totals if an error escapes
    async fn run_into(&mut self, max_depth: u32, report: &mut CrawlReport) -> Result<(), TrawlError> {
        let start_time = Instant::now();
        let mut frontier = self.load_frontier()?;

        while !frontier.is_empty() {
            tracing::info!(
                "Round {}: {} URLs in frontier",
                report.rounds + 1,
                frontier.len()
            );

            while let Some(page) = frontier.pop_front() {
                self.process_page(&page, report).await?;
            }

            report.rounds += 1;

            if max_depth != 0 && report.rounds >= max_depth {
                tracing::info!("Reached max depth of {} rounds", max_depth);
                break;
            }

            frontier = self.load_frontier()?;
        }

        tracing::info!(
            "Crawl finished: {} rounds, {} pages crawled, {} fetch failures, {} new links in {:?}",
            report.rounds,
            report.pages_crawled,
            report.fetch_failures,
            report.links_inserted,
            start_time.elapsed()
        );

        Ok(())
    }

    /// Processes a single frontier record
    async fn process_page(
        &mut self,
        page: &UrlRecord,
        report: &mut CrawlReport,
    ) -> Result<(), TrawlError> {
        // Depth and crawl state are authoritative in the store
        let current = self
            .store
            .get_by_url(&page.url)?
            .ok_or_else(|| StorageError::UrlNotFound(page.url.clone()))?;

        if current.crawled {
            tracing::debug!("Skipping {}: already crawled", current.url);
            return Ok(());
        }

        tracing::debug!("Fetching {} (depth {})", current.url, current.depth);

        let body = match self.fetcher.fetch(&current.url).await {
            Ok(body) => body,
            Err(e) => {
                let attempts = self.store.record_fetch_failure(&current.url)?;
                report.fetch_failures += 1;
                tracing::warn!(
                    "Failed to fetch {} (attempt {}): {}",
                    current.url,
                    attempts,
                    e
                );
                return Ok(());
            }
        };

        let text = String::from_utf8_lossy(&body);
        let parsed = match self.parser.parse(&text, &current.url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", current.url, e);
                ParsedPage::default()
            }
        };

        if self.images.is_some() {
            self.capture_images(&parsed.images, report).await;
        }

        let link_depth = current.depth + 1;
        for link in &parsed.links {
            self.record_link(&current, link, link_depth, report)?;
        }

        // Re-read: a self link may have rewritten this record
        let mut record = self
            .store
            .get_by_url(&current.url)?
            .ok_or_else(|| StorageError::UrlNotFound(current.url.clone()))?;
        record.title = parsed.title.clone().or(record.title.take());
        record.body = Some(parsed.plaintext);
        record.depth = current.depth;
        record.crawled = true;
        self.store.update(&record)?;

        report.pages_crawled += 1;
        self.progress.emit(&format!(
            "Found {} links on {}.",
            parsed.links.len(),
            current.url
        ));

        Ok(())
    }

    /// Inserts or rewrites the record for one discovered link
    fn record_link(
        &mut self,
        referrer: &UrlRecord,
        link: &Link,
        depth: u32,
        report: &mut CrawlReport,
    ) -> Result<(), TrawlError> {
        let title = Some(link.title.clone()).filter(|t| !t.is_empty());

        match self.store.get_by_url(&link.url)? {
            Some(mut existing) => {
                existing.title = title;
                existing.linked_from = Some(referrer.id);
                existing.depth = depth;
                self.store.update(&existing)?;
                report.links_updated += 1;
            }
            None => {
                self.store.insert(&NewUrlRecord {
                    url: link.url.clone(),
                    title,
                    depth,
                    linked_from: Some(referrer.id),
                })?;
                report.links_inserted += 1;
            }
        }

        Ok(())
    }

    /// Runs every image through the filter; failures never touch the page
    async fn capture_images(&self, images: &[String], report: &mut CrawlReport) {
        let Some(filter) = &self.images else {
            return;
        };

        for image_url in images {
            match filter.capture(&self.fetcher, image_url).await {
                Ok(ImageDecision::Accepted(path)) => {
                    report.images_saved += 1;
                    tracing::debug!("Saved image {} to {}", image_url, path.display());
                }
                Ok(decision) => {
                    tracing::trace!("Image {} not downloaded: {:?}", image_url, decision);
                }
                Err(e) => {
                    tracing::warn!("Failed to capture image {}: {}", image_url, e);
                }
            }
        }
    }
}
