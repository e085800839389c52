//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::CrawlConfigBuilder;
use super::types::Viewport;

impl<State> CrawlConfigBuilder<State> {
    /// Global crawl deadline in seconds. Checked against `1..=300` at build time.
    #[must_use]
    pub fn seconds(mut self, seconds: u64) -> Self {
        self.seconds = seconds;
        self
    }

    /// Debug mode: visible browser window and verbose logging
    ///
    /// ```rust
    /// # use redirect_recorder::config::CrawlConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let config = CrawlConfig::builder()
    ///     .start_url("https://example.com")
    ///     .debug(true)
    ///     .build()?;
    /// assert!(!config.headless());
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.headless = !debug;
        self
    }

    /// Override headless mode independently of `debug`
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub fn browser_executable_path(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.browser_executable_path = path.map(Into::into);
        self
    }

    #[must_use]
    pub fn settle_window_ms(mut self, ms: u64) -> Self {
        self.settle_window_ms = ms;
        self
    }

    #[must_use]
    pub fn click_wait_ms(mut self, ms: u64) -> Self {
        self.click_wait_ms = ms;
        self
    }

    #[must_use]
    pub fn click_poll_interval_ms(mut self, ms: u64) -> Self {
        self.click_poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub fn shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Smallest new tab that is merged into the main lineage instead of closed
    #[must_use]
    pub fn full_page_min(mut self, width: u32, height: u32) -> Self {
        self.full_page_min = Viewport::new(width, height);
        self
    }

    /// Follow links that stay on the same domain, for local fixtures
    #[must_use]
    pub fn follow_local_links(mut self, follow: bool) -> Self {
        self.follow_local_links = follow;
        self
    }

    #[must_use]
    pub fn block_images(mut self, block: bool) -> Self {
        self.block_images = block;
        self
    }

    #[must_use]
    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    #[must_use]
    pub fn trigger_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.trigger_endpoint = endpoint;
        self
    }
}
