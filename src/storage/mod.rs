//! Storage module for persisting harvested data
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Idempotent insertion of popes and speeches
//! - Read-only queries used by reporting and downstream tools

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Outcome of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was written with this id
    Inserted(i64),
    /// A row with the same unique key was already present
    AlreadyExists,
}

impl UpsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// A pope as resolved from the site directory
///
/// Fields that could not be determined are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopeRecord {
    pub pope_name: String,
    pub pope_slug: String,
    pub pope_number: String,
    pub secular_name: String,
    pub place_of_birth: String,
    pub pontificate_begin: String,
    pub pontificate_end: String,
}

/// A parsed document ready for insertion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechRecord {
    pub pope_name: String,
    pub section: String,
    pub year: String,
    /// ISO `YYYY-MM-DD`, or empty when the page gave no usable date
    pub date: String,
    pub location: String,
    pub title: String,
    /// Uppercase two-letter code
    pub language: String,
    pub url: String,
    pub text: String,
}

/// A stored pope row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPope {
    pub id: i64,
    pub pope: PopeRecord,
    pub entry_creation_date: String,
}

/// A stored speech row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSpeech {
    pub id: i64,
    pub speech: SpeechRecord,
    pub entry_creation_date: String,
}
