//! Vatican speeches main entry point
//!
//! This is the command-line interface for the vatican.va speech harvester.

use chrono::Datelike;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vatican_speeches::config::{load_config_with_hash, Config};
use vatican_speeches::crawler::{harvest, CancelFlag};
use vatican_speeches::output::{load_statistics, print_plan, print_run_summary, print_statistics};
use vatican_speeches::selector::SelectorSet;
use vatican_speeches::storage::SqliteStorage;

/// Vatican speeches: a polite harvester for papal texts
///
/// Crawls the speech archives of vatican.va for the given popes, sections,
/// years and languages, and stores every document once in a SQLite
/// database. Re-running the same selection only adds what is new.
#[derive(Parser, Debug)]
#[command(name = "vatican-speeches")]
#[command(version)]
#[command(about = "A polite harvester for papal speeches", long_about = None)]
struct Cli {
    /// Comma-separated pope display names
    #[arg(long, default_value = "Francis")]
    popes: String,

    /// Comma-separated sections (homilies, audiences, angelus, speeches, ...)
    #[arg(long, default_value = "homilies")]
    section: String,

    /// Year, inclusive range or comma list, e.g. 2020 or 1963-2026 [default: current year]
    #[arg(long)]
    years: Option<String>,

    /// Comma-separated two-letter language codes
    #[arg(long, default_value = "EN")]
    lang: String,

    /// Global cap on speeches inserted by this run
    #[arg(long = "max_n_speeches", visible_alias = "max-n-speeches", default_value_t = 5)]
    max_n_speeches: usize,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database path, overriding the configuration
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the selection and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    if let Some(database) = &cli.database {
        config.output.database_path = database.to_string_lossy().into_owned();
    }

    if cli.stats {
        return handle_stats(&config);
    }

    let years = cli
        .years
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().year().to_string());
    let selectors = match SelectorSet::parse(&cli.popes, &cli.section, &years, &cli.lang) {
        Ok(selectors) => selectors,
        Err(e) => {
            tracing::error!("Invalid selection: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        print_plan(&config, &selectors, cli.max_n_speeches);
        return Ok(());
    }

    handle_harvest(&config, selectors, cli.max_n_speeches).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vatican_speeches=info,warn"),
            1 => EnvFilter::new("vatican_speeches=debug,info"),
            2 => EnvFilter::new("vatican_speeches=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: &Config,
    selectors: SelectorSet,
    max_speeches: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current document");
            on_interrupt.cancel();
        }
    });

    match harvest(config, selectors, max_speeches, cancel).await {
        Ok(summary) => {
            print_run_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest could not start: {}", e);
            Err(e.into())
        }
    }
}
