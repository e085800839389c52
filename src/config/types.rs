//! Core configuration types for a redirect-chain crawl
//!
//! This module contains the main `CrawlConfig` struct and the small value
//! types it is built from.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    CLICK_POLL_INTERVAL_MS, DEFAULT_BUCKET, DEFAULT_CLICK_WAIT_MS, DEFAULT_CRAWL_SECONDS,
    DEFAULT_SETTLE_WINDOW_MS, DEFAULT_SHUTDOWN_GRACE_MS, FULL_PAGE_MIN_HEIGHT,
    FULL_PAGE_MIN_WIDTH, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};

/// Width and height of a browser viewport in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if this viewport is at least as large as `min` in both dimensions
    #[must_use]
    pub fn covers(&self, min: &Viewport) -> bool {
        self.width >= min.width && self.height >= min.height
    }
}

impl std::fmt::Display for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Main configuration struct for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) start_url: String,

    /// Global crawl deadline in seconds (1..=300)
    pub(crate) seconds: u64,

    /// Headed browser and verbose logging
    pub(crate) debug: bool,
    pub(crate) headless: bool,

    /// Explicit browser binary; discovered from the environment when unset
    pub(crate) browser_executable_path: Option<PathBuf>,

    /// How long a page must go without a load event before it counts as settled
    pub(crate) settle_window_ms: u64,

    /// How long a clicked anchor has to move the page
    pub(crate) click_wait_ms: u64,
    pub(crate) click_poll_interval_ms: u64,

    /// Grace period for the main page's unload handlers during shutdown
    pub(crate) shutdown_grace_ms: u64,

    pub(crate) viewport: Viewport,

    /// New tabs at least this large are merged into the main lineage
    pub(crate) full_page_min: Viewport,

    /// Local fixture mode
    ///
    /// Discovery keeps same-domain and short links, and a click counts as
    /// navigating when the full URL changes instead of the host. Used by the
    /// browser scenario tests, whose fixtures all live on one local server.
    pub(crate) follow_local_links: bool,

    /// Abort image requests as well as fonts
    pub(crate) block_images: bool,

    /// Bucket the finished log is uploaded to
    pub(crate) bucket: String,

    /// Where the downstream processor is notified about a new log
    pub(crate) trigger_endpoint: Option<String>,

    /// Chrome user data directory for browser profile isolation
    /// When unset a throwaway temporary directory is used per run.
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            seconds: DEFAULT_CRAWL_SECONDS,
            debug: false,
            headless: true,
            browser_executable_path: None,
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            click_wait_ms: DEFAULT_CLICK_WAIT_MS,
            click_poll_interval_ms: CLICK_POLL_INTERVAL_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            viewport: Viewport::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
            full_page_min: Viewport::new(FULL_PAGE_MIN_WIDTH, FULL_PAGE_MIN_HEIGHT),
            follow_local_links: false,
            block_images: false,
            bucket: DEFAULT_BUCKET.to_string(),
            trigger_endpoint: None,
            chrome_data_dir: None,
        }
    }
}

impl CrawlConfig {
    /// Set Chrome user data directory for browser profile isolation
    ///
    /// # Example
    /// ```rust
    /// # use redirect_recorder::config::CrawlConfig;
    /// # fn main() -> anyhow::Result<()> {
    /// let chrome_dir = std::env::temp_dir().join("chrome_redirects");
    /// let config = CrawlConfig::builder()
    ///     .start_url("https://example.com")
    ///     .build()?
    ///     .with_chrome_data_dir(chrome_dir);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn with_chrome_data_dir(mut self, dir: PathBuf) -> Self {
        self.chrome_data_dir = Some(dir);
        self
    }

    /// Get the Chrome user data directory if configured
    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}
