//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PopeRecord, SpeechRecord, StoredPope, StoredSpeech, UpsertOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Uniqueness conflicts are not errors; they surface as
/// [`UpsertOutcome::AlreadyExists`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is a single statement, so an interrupted run never leaves a
/// half-written document behind.
pub trait Storage {
    // ===== Schema =====

    /// Creates the tables and indexes when absent; safe to call repeatedly
    fn ensure_schema(&mut self) -> StorageResult<()>;

    // ===== Writes =====

    /// Inserts a pope unless one with the same (name, number) exists
    ///
    /// # Returns
    ///
    /// * `Inserted(id)` - A new row was written
    /// * `AlreadyExists` - The row was already present and left untouched
    fn upsert_pope(&mut self, pope: &PopeRecord) -> StorageResult<UpsertOutcome>;

    /// Inserts a speech unless one with the same (pope, title, date) exists
    ///
    /// First write wins: an existing row is never updated.
    fn upsert_speech(&mut self, speech: &SpeechRecord) -> StorageResult<UpsertOutcome>;

    // ===== Reads =====

    /// True when a speech with this URL is already stored
    fn speech_url_exists(&self, url: &str) -> StorageResult<bool>;

    /// All popes, by ordinal then name
    fn list_popes(&self) -> StorageResult<Vec<StoredPope>>;

    /// Speeches of one pope, by date
    fn speeches_by_pope(&self, pope_name: &str) -> StorageResult<Vec<StoredSpeech>>;

    /// Speeches of one section, by date
    fn speeches_by_section(&self, section: &str) -> StorageResult<Vec<StoredSpeech>>;

    /// Speeches dated within `[from, to]`, both ISO `YYYY-MM-DD`
    ///
    /// Speeches with an empty date never match.
    fn speeches_in_date_range(&self, from: &str, to: &str) -> StorageResult<Vec<StoredSpeech>>;

    // ===== Statistics =====

    /// Total number of stored popes
    fn count_popes(&self) -> StorageResult<u64>;

    /// Total number of stored speeches
    fn count_speeches(&self) -> StorageResult<u64>;

    /// Speech counts per pope name, largest first
    fn count_speeches_by_pope(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Speech counts per section, largest first
    fn count_speeches_by_section(&self) -> StorageResult<Vec<(String, u64)>>;
}
