//! Harvest pipeline: fetching, index walking, page parsing and orchestration
//!
//! This module contains the core harvesting logic, including:
//! - Rate-limited HTTP fetching with retry
//! - Pagination over a slice's year index
//! - Speech page extraction
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod index;
mod limiter;
mod parser;

pub use coordinator::{CancelFlag, Coordinator, PopeStage, RunSummary};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use index::{index_url, parse_index_page, Candidate, IndexCursor, IndexPage, IndexPageFailure};
pub use limiter::{RateLimiter, RetryPolicy};
pub use parser::{
    find_translation_url, parse_speech_html, served_language, PageFailure, ParseFailure,
    ParsedSpeech, SpeechContext, SpeechPageParser,
};

use crate::config::Config;
use crate::selector::SelectorSet;

/// Runs a complete harvest against the configured store
///
/// This is the main entry point for a run. It will:
/// 1. Open (or create) the store
/// 2. Build the rate-limited fetcher
/// 3. Walk every selector slice, storing new speeches
/// 4. Return the run summary
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `selectors` - What to crawl
/// * `max_speeches` - Global cap on inserted speeches
/// * `cancel` - Flag checked between documents
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed, possibly with per-document failures
/// * `Err(HarvestError)` - The store or HTTP client could not be set up
pub async fn harvest(
    config: &Config,
    selectors: SelectorSet,
    max_speeches: usize,
    cancel: CancelFlag,
) -> crate::Result<RunSummary> {
    let mut coordinator =
        Coordinator::from_config(config, selectors, max_speeches)?.with_cancel_flag(cancel);
    Ok(coordinator.run().await)
}
