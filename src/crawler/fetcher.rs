//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with a descriptive user agent string
//! - Rate limiting through a shared [`RateLimiter`]
//! - Retry with exponential backoff for transient failures
//! - Classification of every outcome into a [`FetchResult`]

use super::limiter::{RateLimiter, RetryPolicy};
use crate::config::{Config, FetcherConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The server refused the request with a non-retryable status
    Rejected {
        /// The HTTP status code
        status_code: u16,
    },

    /// The page does not exist (404 or 410)
    NotFound {
        /// The HTTP status code
        status_code: u16,
    },

    /// Transient failures persisted through every attempt
    FetchFailed {
        /// The requested URL
        url: String,
        /// Attempts made, the first one included
        attempts: u32,
        /// Description of the last failure
        error: String,
    },
}

impl FetchResult {
    /// True for [`FetchResult::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// True for [`FetchResult::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status_code, .. } => write!(f, "HTTP {}", status_code),
            Self::Rejected { status_code } => write!(f, "rejected with HTTP {}", status_code),
            Self::NotFound { status_code } => write!(f, "not found (HTTP {})", status_code),
            Self::FetchFailed {
                attempts, error, ..
            } => write!(f, "failed after {} attempts: {}", attempts, error),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetcher` - Timeout settings
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use vatican_speeches::config::{FetcherConfig, UserAgentConfig};
/// use vatican_speeches::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(fetcher.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A rate-limited, retrying HTTP GET client
///
/// Every request, retries included, passes through the same limiter, so the
/// politeness interval holds across index pages, document pages and
/// biography pages alike.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

/// Outcome of a single attempt
enum Attempt {
    Done(FetchResult),
    Transient(String),
}

impl Fetcher {
    /// Creates a fetcher from its parts
    pub fn new(client: Client, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// Creates a fetcher from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.fetcher, &config.user_agent)?;
        Ok(Self::new(
            client,
            RateLimiter::from(&config.fetcher),
            RetryPolicy::from(&config.fetcher),
        ))
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 404 / 410 | Immediate → NotFound |
    /// | Other HTTP 4xx | Immediate → Rejected |
    /// | HTTP 429 / 5xx | Retry with backoff |
    /// | Timeout, connection or body error | Retry with backoff |
    ///
    /// When the attempts run out the last error is reported as
    /// [`FetchResult::FetchFailed`]. This never panics and never returns a
    /// Rust error; every failure is a value.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.limiter.wait().await;

            let error = match self.attempt(url).await {
                Attempt::Done(result) => return result,
                Attempt::Transient(error) => error,
            };

            if attempt >= self.retry.max_attempts {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt, error);
                return FetchResult::FetchFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    error,
                };
            }

            let delay = self.retry.delay_for(attempt);
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt,
                url,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, url: &str) -> Attempt {
        tracing::trace!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Transient(describe_error(&e)),
        };

        let status = response.status();
        let final_url = response.url().to_string();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Attempt::Done(FetchResult::NotFound {
                status_code: status.as_u16(),
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Attempt::Transient(format!("HTTP {}", status.as_u16()));
        }

        if !status.is_success() {
            return Attempt::Done(FetchResult::Rejected {
                status_code: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) => Attempt::Done(FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
            }),
            Err(e) => Attempt::Transient(format!("failed to read body: {}", e)),
        }
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else if e.is_redirect() {
        "too many redirects".to_string()
    } else {
        e.to_string()
    }
}
