//! Harvest coordinator - main orchestration logic
//!
//! This module drives a run through the selector cross-product:
//! - Resolving each pope once and recording it in the store
//! - Walking the index of every (section, year, language) slice
//! - Fetching, parsing and storing each candidate document
//! - Enforcing the global document cap and honoring interrupts
//!
//! Every per-page and per-document failure is counted and logged; none of
//! them stops the run.

use super::fetcher::Fetcher;
use super::index::{Candidate, IndexCursor};
use super::parser::{PageFailure, SpeechContext, SpeechPageParser};
use crate::config::Config;
use crate::directory::PopeDirectory;
use crate::selector::{Selector, SelectorSet};
use crate::storage::{PopeRecord, SqliteStorage, Storage, UpsertOutcome};
use crate::HarvestError;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Shared flag asking a run to stop between documents
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress of one pope through a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopeStage {
    Pending,
    Resolving,
    Crawling,
    Draining,
    Done,
}

impl fmt::Display for PopeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Resolving => "resolving",
            Self::Crawling => "crawling",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Aggregate counts for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Speeches written by this run
    pub inserted: usize,
    /// Candidates already present (by URL or by unique key)
    pub already_existing: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    /// Index pages that failed and cut a slice short
    pub crawl_page_failures: usize,
    pub resolution_failures: usize,
    /// Writes the store refused for reasons other than uniqueness
    pub storage_failures: usize,
    pub popes_inserted: usize,
    /// Popes crawled but not recorded because their ordinal is unknown
    pub popes_deferred: usize,
    pub candidates_seen: usize,
    /// Slices whose first index page does not exist
    pub empty_slices: usize,
    pub slices_crawled: usize,
    pub cap_reached: bool,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Failures of any kind
    pub fn total_failures(&self) -> usize {
        self.fetch_failures
            + self.parse_failures
            + self.crawl_page_failures
            + self.resolution_failures
            + self.storage_failures
    }
}

/// Main harvest coordinator structure
pub struct Coordinator<S: Storage> {
    fetcher: Fetcher,
    storage: S,
    directory: PopeDirectory,
    base_url: Url,
    selectors: SelectorSet,
    max_speeches: usize,
    cancel: CancelFlag,
}

impl Coordinator<SqliteStorage> {
    /// Creates a coordinator from configuration, opening the configured store
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `selectors` - What to crawl
    /// * `max_speeches` - Global cap on inserted speeches
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The store or the HTTP client could not be set up
    pub fn from_config(
        config: &Config,
        selectors: SelectorSet,
        max_speeches: usize,
    ) -> Result<Self, HarvestError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let fetcher = Fetcher::from_config(config)?;
        let base_url = Url::parse(&config.source.base_url)?;

        Ok(Self::new(fetcher, storage, base_url, selectors, max_speeches))
    }
}

impl<S: Storage> Coordinator<S> {
    /// Creates a coordinator from its parts
    pub fn new(
        fetcher: Fetcher,
        storage: S,
        base_url: Url,
        selectors: SelectorSet,
        max_speeches: usize,
    ) -> Self {
        Self {
            fetcher,
            storage,
            directory: PopeDirectory::new(base_url.clone()),
            base_url,
            selectors,
            max_speeches,
            cancel: CancelFlag::new(),
        }
    }

    /// Uses `cancel` to receive interrupt requests
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs the harvest to completion
    ///
    /// Stops early when the document cap is reached or the cancel flag is
    /// set; either way the store is left valid and the run can be repeated.
    pub async fn run(&mut self) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        tracing::info!(
            "Starting harvest: {} popes, {} slices, cap {}",
            self.selectors.popes.len(),
            self.selectors.total_slices(),
            self.max_speeches
        );

        let popes = self.selectors.popes.clone();
        for pope in &popes {
            if self.should_stop(&mut summary) {
                break;
            }
            self.harvest_pope(pope, &mut summary).await;
        }

        summary.elapsed = started.elapsed();
        tracing::info!(
            "Harvest finished in {:.1}s: {} inserted, {} already present, {} failures",
            summary.elapsed.as_secs_f64(),
            summary.inserted,
            summary.already_existing,
            summary.total_failures()
        );

        summary
    }

    fn should_stop(&self, summary: &mut RunSummary) -> bool {
        if summary.inserted >= self.max_speeches {
            summary.cap_reached = true;
            return true;
        }
        if self.cancel.is_cancelled() {
            summary.interrupted = true;
            return true;
        }
        false
    }

    async fn harvest_pope(&mut self, name: &str, summary: &mut RunSummary) {
        let mut stage = PopeStage::Pending;
        advance(name, &mut stage, PopeStage::Resolving);

        let pope = match self.directory.resolve(&self.fetcher, name).await {
            Ok(pope) => pope,
            Err(e) => {
                tracing::warn!("Skipping pope: {}", e);
                summary.resolution_failures += 1;
                advance(name, &mut stage, PopeStage::Done);
                return;
            }
        };

        record_pope(&mut self.storage, &pope, summary);

        advance(name, &mut stage, PopeStage::Crawling);
        let inserted_before = summary.inserted;

        let selectors = self.selectors.clone();
        for selector in selectors.selectors_for(name) {
            if self.should_stop(summary) {
                break;
            }
            self.harvest_slice(&pope, &selector, summary).await;
        }

        advance(name, &mut stage, PopeStage::Draining);
        tracing::info!(
            "Pope {}: {} speeches inserted",
            pope.pope_name,
            summary.inserted - inserted_before
        );
        advance(name, &mut stage, PopeStage::Done);
    }

    async fn harvest_slice(&mut self, pope: &PopeRecord, selector: &Selector, summary: &mut RunSummary) {
        tracing::info!("Crawling {}", selector);
        summary.slices_crawled += 1;

        let mut cursor = match IndexCursor::new(&self.fetcher, &self.base_url, &pope.pope_slug, selector) {
            Ok(cursor) => cursor,
            Err(e) => {
                tracing::warn!("[{}] cannot build index URL: {}", selector, e);
                summary.crawl_page_failures += 1;
                return;
            }
        };

        loop {
            if summary.inserted >= self.max_speeches {
                summary.cap_reached = true;
                break;
            }
            if self.cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }

            let remaining = self.max_speeches - summary.inserted;
            let Some(candidate) = cursor.next(remaining).await else {
                break;
            };
            summary.candidates_seen += 1;

            process_candidate(&self.fetcher, &mut self.storage, pope, selector, &candidate, summary)
                .await;
        }

        if let Some(failure) = cursor.take_failure() {
            if failure.page_number == 1 && failure.result.is_not_found() {
                tracing::info!("[{}] no archive at {}", selector, failure.url);
                summary.empty_slices += 1;
            } else {
                tracing::warn!(
                    "[{}] index page {} failed ({}), slice cut short",
                    selector,
                    failure.url,
                    failure.result
                );
                summary.crawl_page_failures += 1;
            }
        }

        tracing::debug!("[{}] {} index pages walked", selector, cursor.pages_fetched());
    }
}

fn advance(pope: &str, stage: &mut PopeStage, next: PopeStage) {
    tracing::debug!("Pope {}: {} -> {}", pope, stage, next);
    *stage = next;
}

/// Writes the pope row once its ordinal is known
///
/// The ordinal is part of the row's unique key, so a row written without it
/// would be duplicated as soon as a later run learns it. Such popes are still
/// crawled; their speeches reference them by name only.
fn record_pope<S: Storage>(storage: &mut S, pope: &PopeRecord, summary: &mut RunSummary) {
    if pope.pope_number.is_empty() {
        tracing::warn!(
            "Ordinal of pope {} unknown, not recording the pope this run",
            pope.pope_name
        );
        summary.popes_deferred += 1;
        return;
    }

    match storage.upsert_pope(pope) {
        Ok(UpsertOutcome::Inserted(id)) => {
            tracing::info!("Recorded pope {} (id {})", pope.pope_name, id);
            summary.popes_inserted += 1;
        }
        Ok(UpsertOutcome::AlreadyExists) => {
            tracing::debug!("Pope {} already recorded", pope.pope_name);
        }
        Err(e) => {
            tracing::warn!("Failed to record pope {}: {}", pope.pope_name, e);
            summary.storage_failures += 1;
        }
    }
}

async fn process_candidate<S: Storage>(
    fetcher: &Fetcher,
    storage: &mut S,
    pope: &PopeRecord,
    selector: &Selector,
    candidate: &Candidate,
    summary: &mut RunSummary,
) {
    match storage.speech_url_exists(&candidate.url) {
        Ok(true) => {
            tracing::debug!("[{}] already stored: {}", selector, candidate.url);
            summary.already_existing += 1;
            return;
        }
        Ok(false) => {}
        Err(e) => tracing::warn!("[{}] URL lookup failed for {}: {}", selector, candidate.url, e),
    }

    let context = SpeechContext::new(&pope.pope_name, selector, candidate);
    let record = match SpeechPageParser::parse(fetcher, candidate, &context).await {
        Ok(record) => record,
        Err(PageFailure::Fetch(result)) => {
            tracing::warn!("[{}] fetch failed for {}: {}", selector, candidate.url, result);
            summary.fetch_failures += 1;
            return;
        }
        Err(PageFailure::Parse(failure)) => {
            tracing::warn!("[{}] {}", selector, failure);
            summary.parse_failures += 1;
            return;
        }
    };

    match storage.upsert_speech(&record) {
        Ok(UpsertOutcome::Inserted(id)) => {
            summary.inserted += 1;
            tracing::info!(
                "[{}] stored #{} '{}' ({}) as id {}",
                selector,
                summary.inserted,
                record.title,
                record.date,
                id
            );
        }
        Ok(UpsertOutcome::AlreadyExists) => {
            tracing::debug!(
                "[{}] '{}' ({}) already stored",
                selector,
                record.title,
                record.date
            );
            summary.already_existing += 1;
        }
        Err(e) => {
            tracing::warn!("[{}] failed to store {}: {}", selector, record.url, e);
            summary.storage_failures += 1;
        }
    }
}
