//! Getter methods for `CrawlConfig`

use std::path::Path;
use std::time::Duration;

use super::types::{CrawlConfig, Viewport};

impl CrawlConfig {
    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// The global deadline as a `Duration`
    #[must_use]
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.seconds)
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn browser_executable_path(&self) -> Option<&Path> {
        self.browser_executable_path.as_deref()
    }

    #[must_use]
    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    #[must_use]
    pub fn click_wait(&self) -> Duration {
        Duration::from_millis(self.click_wait_ms)
    }

    #[must_use]
    pub fn click_poll_interval(&self) -> Duration {
        Duration::from_millis(self.click_poll_interval_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn full_page_min(&self) -> Viewport {
        self.full_page_min
    }

    #[must_use]
    pub fn follow_local_links(&self) -> bool {
        self.follow_local_links
    }

    #[must_use]
    pub fn block_images(&self) -> bool {
        self.block_images
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn trigger_endpoint(&self) -> Option<&str> {
        self.trigger_endpoint.as_deref()
    }
}
