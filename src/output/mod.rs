//! Output module for run summaries and store reports
//!
//! This module handles:
//! - Printing the summary of a finished harvest run
//! - Printing store statistics for the `--stats` reader mode
//! - Printing the selector plan for `--dry-run`

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};

use crate::config::Config;
use crate::crawler::RunSummary;
use crate::selector::SelectorSet;

/// Renders a run summary as report lines
pub fn format_run_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        "=== Harvest Summary ===".to_string(),
        format!("  Speeches inserted:     {}", summary.inserted),
        format!("  Already present:       {}", summary.already_existing),
        format!("  Candidates seen:       {}", summary.candidates_seen),
        format!("  Slices crawled:        {}", summary.slices_crawled),
        format!("  Slices without archive: {}", summary.empty_slices),
        format!("  Popes recorded:        {}", summary.popes_inserted),
        format!("  Popes without ordinal: {}", summary.popes_deferred),
        format!("  Fetch failures:        {}", summary.fetch_failures),
        format!("  Parse failures:        {}", summary.parse_failures),
        format!("  Index page failures:   {}", summary.crawl_page_failures),
        format!("  Unresolved popes:      {}", summary.resolution_failures),
        format!("  Storage failures:      {}", summary.storage_failures),
        format!("  Elapsed:               {:.1}s", summary.elapsed.as_secs_f64()),
    ];

    if summary.cap_reached {
        lines.push("  Stopped: speech cap reached".to_string());
    }
    if summary.interrupted {
        lines.push("  Stopped: interrupted, re-run to continue".to_string());
    }

    lines
}

/// Prints a run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    for line in format_run_summary(summary) {
        println!("{}", line);
    }
}

/// Prints what a run would do, without touching the network or the store
pub fn print_plan(config: &Config, selectors: &SelectorSet, max_speeches: usize) {
    println!("=== Harvest Plan ===\n");
    println!("Source:    {}", config.source.base_url);
    println!("Database:  {}", config.output.database_path);
    println!("User agent: {}", config.user_agent.header_value());
    println!(
        "Politeness: {}ms between requests, {} attempts per request",
        config.fetcher.politeness_interval_ms, config.fetcher.max_attempts
    );
    println!();

    println!("Popes:     {}", selectors.popes.join(", "));
    println!(
        "Sections:  {}",
        selectors
            .sections
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Years:     {}", describe_years(&selectors.years));
    println!(
        "Languages: {}",
        selectors
            .languages
            .iter()
            .map(|l| l.code())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();
    println!(
        "{} slices, at most {} speeches",
        selectors.total_slices(),
        max_speeches
    );
}

/// `[2019, 2020, 2021, 2023]` → `2019-2021, 2023`
fn describe_years(years: &[u16]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = years.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(", ")
}
