//! Error type, result alias and the `Crawler` trait.

use std::fmt;

/// Custom error type for crawl operations
#[derive(Debug, Clone)]
pub enum CrawlError {
    /// The run configuration was rejected before launch
    ConfigError(String),
    /// The browser could not be launched or driven
    BrowserError(String),
    /// The crawl task went away without delivering a log
    Cancelled,
    /// Other errors
    Other(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            Self::BrowserError(msg) => write!(f, "Browser error: {msg}"),
            Self::Cancelled => write!(f, "Crawl operation was cancelled"),
            Self::Other(msg) => write!(f, "Crawl error: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

impl From<crate::config::ValidationError> for CrawlError {
    fn from(err: crate::config::ValidationError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

use crate::CrawlRequest;

/// A trait defining the interface for redirect-chain crawlers.
pub trait Crawler {
    /// Create a new crawler with the given configuration.
    fn new(config: crate::config::CrawlConfig) -> Self;

    /// Follow the navigation chain from the configured seed URL.
    /// Returns a `CrawlRequest` that resolves to the ordered event log.
    fn crawl(&self) -> CrawlRequest;
}
