//! Vatican speeches: a polite harvester for papal texts
//!
//! This crate crawls the speech, homily and audience archives published on
//! vatican.va, organized by pope, section, year and language, and loads every
//! document exactly once into a SQLite store.

pub mod config;
pub mod crawler;
pub mod directory;
pub mod output;
pub mod selector;
pub mod storage;
pub mod text;

use thiserror::Error;

/// Main error type for harvester operations
///
/// Only conditions that stop a run before it starts end up here. Failures of
/// individual pages and documents are counted by the coordinator instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while parsing crawl selectors from the command line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Unknown section '{given}', expected one of: {expected}")]
    UnknownSection { given: String, expected: String },

    #[error("Invalid year specification '{0}'")]
    InvalidYears(String),

    #[error("Invalid language code '{0}', expected two letters such as EN or IT")]
    InvalidLanguage(String),

    #[error("No popes given")]
    NoPopes,

    #[error("Selector list for {0} is empty")]
    Empty(&'static str),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, RunSummary};
pub use selector::{Language, Section, SelectorSet};
pub use storage::{SqliteStorage, Storage, UpsertOutcome};
