use crate::config::types::{Config, FetcherConfig, OutputConfig, SourceConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_source_config(&config.source)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Validation(message()))
    }
}

/// Validates fetch timing and retry settings
///
/// The site is crawled with a single connection, so anything faster than
/// ten requests per second is refused outright.
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    ensure(config.politeness_interval_ms >= 100, || {
        format!(
            "politeness-interval-ms must be at least 100, got {}",
            config.politeness_interval_ms
        )
    })?;
    ensure((1..=10).contains(&config.max_attempts), || {
        format!("max-attempts must be between 1 and 10, got {}", config.max_attempts)
    })?;
    ensure(config.backoff_max_ms >= config.backoff_base_ms, || {
        format!(
            "backoff-max-ms ({}) is below backoff-base-ms ({})",
            config.backoff_max_ms, config.backoff_base_ms
        )
    })?;
    ensure(config.timeout_secs >= 1, || {
        "timeout-secs must be at least 1".to_string()
    })
}

/// The user agent identifies the harvester to the site operators
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    let name = &config.crawler_name;
    ensure(!name.is_empty(), || "crawler-name cannot be empty".to_string())?;
    ensure(
        name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
        || format!("crawler-name may only use letters, digits and '-', got '{}'", name),
    )?;

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("contact-url: {}", e)))?;

    validate_email(&config.contact_email)
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("base-url: {}", e)))?;

    ensure(matches!(url.scheme(), "http" | "https"), || {
        format!("base-url '{}' must use http or https", config.base_url)
    })?;

    // Site paths are joined onto the base, which drops a last segment without '/'
    ensure(url.path().ends_with('/'), || {
        format!("base-url '{}' must end with '/'", config.base_url)
    })
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    ensure(!config.database_path.trim().is_empty(), || {
        "database-path cannot be empty".to_string()
    })
}

/// `local@domain.tld`, nothing more elaborate
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    };

    ensure(well_formed, || {
        format!("contact-email '{}' is not a valid address", email)
    })
}
