//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! `build()` only exists once a start URL has been supplied.

use anyhow::Result;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{CrawlConfig, Viewport};
use super::validation::ValidationError;
use crate::utils::MAX_CRAWL_SECONDS;

// Type states for the builder
pub struct WithStartUrl;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) start_url: Option<String>,
    pub(crate) seconds: u64,
    pub(crate) debug: bool,
    pub(crate) headless: bool,
    pub(crate) browser_executable_path: Option<PathBuf>,
    pub(crate) settle_window_ms: u64,
    pub(crate) click_wait_ms: u64,
    pub(crate) click_poll_interval_ms: u64,
    pub(crate) shutdown_grace_ms: u64,
    pub(crate) viewport: Viewport,
    pub(crate) full_page_min: Viewport,
    pub(crate) follow_local_links: bool,
    pub(crate) block_images: bool,
    pub(crate) bucket: String,
    pub(crate) trigger_endpoint: Option<String>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        let defaults = CrawlConfig::default();
        Self {
            start_url: None,
            seconds: defaults.seconds,
            debug: defaults.debug,
            headless: defaults.headless,
            browser_executable_path: defaults.browser_executable_path,
            settle_window_ms: defaults.settle_window_ms,
            click_wait_ms: defaults.click_wait_ms,
            click_poll_interval_ms: defaults.click_poll_interval_ms,
            shutdown_grace_ms: defaults.shutdown_grace_ms,
            viewport: defaults.viewport,
            full_page_min: defaults.full_page_min,
            follow_local_links: defaults.follow_local_links,
            block_images: defaults.block_images,
            bucket: defaults.bucket,
            trigger_endpoint: defaults.trigger_endpoint,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl CrawlConfigBuilder<()> {
    pub fn start_url(self, url: impl Into<String>) -> CrawlConfigBuilder<WithStartUrl> {
        let url_string = url.into().trim().to_string();

        // Normalize URL: add https:// if no scheme is present
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        CrawlConfigBuilder {
            start_url: Some(normalized_url),
            seconds: self.seconds,
            debug: self.debug,
            headless: self.headless,
            browser_executable_path: self.browser_executable_path,
            settle_window_ms: self.settle_window_ms,
            click_wait_ms: self.click_wait_ms,
            click_poll_interval_ms: self.click_poll_interval_ms,
            shutdown_grace_ms: self.shutdown_grace_ms,
            viewport: self.viewport,
            full_page_min: self.full_page_min,
            follow_local_links: self.follow_local_links,
            block_images: self.block_images,
            bucket: self.bucket,
            trigger_endpoint: self.trigger_endpoint,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<CrawlConfig> {
        let start_url = match self.start_url {
            Some(url) if url != "https://" => url,
            _ => return Err(ValidationError::MissingUrl.into()),
        };
        url::Url::parse(&start_url).map_err(|e| ValidationError::InvalidUrl {
            url: start_url.clone(),
            reason: e.to_string(),
        })?;

        if self.seconds == 0 || self.seconds > MAX_CRAWL_SECONDS {
            let seconds = i64::try_from(self.seconds).unwrap_or(i64::MAX);
            return Err(ValidationError::SecondsOutOfRange(seconds).into());
        }

        Ok(CrawlConfig {
            start_url,
            seconds: self.seconds,
            debug: self.debug,
            headless: self.headless,
            browser_executable_path: self.browser_executable_path,
            settle_window_ms: self.settle_window_ms,
            click_wait_ms: self.click_wait_ms,
            click_poll_interval_ms: self.click_poll_interval_ms.max(1),
            shutdown_grace_ms: self.shutdown_grace_ms,
            viewport: self.viewport,
            full_page_min: self.full_page_min,
            follow_local_links: self.follow_local_links,
            block_images: self.block_images,
            bucket: self.bucket,
            trigger_endpoint: self.trigger_endpoint,
            chrome_data_dir: None,
        })
    }
}
