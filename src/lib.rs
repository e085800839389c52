pub mod browser_setup;
pub mod config;
pub mod crawl_engine;
pub mod crawl_events;
pub mod crawl_state;
pub mod report;
pub mod runtime;
pub mod utils;

pub use browser_setup::{LaunchedBrowser, find_browser_executable, launch_browser};
pub use config::{CrawlArgs, CrawlConfig, ValidationError, Viewport};
pub use crawl_engine::{CrawlError, CrawlResult, Crawler, RedirectCrawler, crawl, run_crawl};
pub use crawl_events::{CrawlEvent, ShutdownReason};
pub use crawl_state::{CrawlState, StateError};
pub use report::{FsObjectStore, ObjectStore, ReportError, Trigger};
pub use runtime::CrawlRequest;
pub use utils::{domain_of, file_extension_of, host_of, is_http_url};
