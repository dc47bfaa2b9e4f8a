//! Statistics from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! store statistics for the `--stats` reader mode.

use crate::storage::{Storage, StorageResult, StoredPope};

/// Store statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Total number of stored speeches
    pub total_speeches: u64,

    /// Total number of stored popes
    pub total_popes: u64,

    /// Popes with their metadata, by ordinal
    pub popes: Vec<StoredPope>,

    /// Speech counts per pope, largest first
    pub speeches_by_pope: Vec<(String, u64)>,

    /// Speech counts per section, largest first
    pub speeches_by_section: Vec<(String, u64)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        total_speeches: storage.count_speeches()?,
        total_popes: storage.count_popes()?,
        popes: storage.list_popes()?,
        speeches_by_pope: storage.count_speeches_by_pope()?,
        speeches_by_section: storage.count_speeches_by_section()?,
    })
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Popes: {}", stats.total_popes);
    println!("  Speeches: {}", stats.total_speeches);
    println!();

    if !stats.popes.is_empty() {
        println!("Popes:");
        for stored in &stats.popes {
            let pope = &stored.pope;
            let number = if pope.pope_number.is_empty() {
                "?"
            } else {
                pope.pope_number.as_str()
            };
            println!(
                "  #{} {} ({}) born in {}, from {} to {}",
                number,
                pope.pope_name,
                or_unknown(&pope.secular_name),
                or_unknown(&pope.place_of_birth),
                or_unknown(&pope.pontificate_begin),
                if pope.pontificate_end.is_empty() {
                    "present"
                } else {
                    pope.pontificate_end.as_str()
                }
            );
        }
        println!();
    }

    if !stats.speeches_by_pope.is_empty() {
        println!("Speeches by Pope:");
        for (pope, count) in &stats.speeches_by_pope {
            println!(
                "  {}: {} ({:.1}%)",
                pope,
                count,
                percentage(*count, stats.total_speeches)
            );
        }
        println!();
    }

    if !stats.speeches_by_section.is_empty() {
        println!("Speeches by Section:");
        for (section, count) in &stats.speeches_by_section {
            println!(
                "  {}: {} ({:.1}%)",
                section,
                count,
                percentage(*count, stats.total_speeches)
            );
        }
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "unknown"
    } else {
        value
    }
}
