//! Crawl Engine Module
//!
//! Everything that drives the browser: page instrumentation, link discovery,
//! click-through navigation, tab triage, shutdown, and the orchestrator that
//! ties them together around a single signal channel.

// Sub-modules
pub mod cleanup;
pub mod crawl_types;
pub mod crawler;
pub mod link_processor;
pub mod navigation;
pub mod orchestrator;
pub mod page_enhancer;
pub mod page_timeout;
pub mod pending_signals;
pub mod tab_triage;

// Re-export the orchestrator entry points
pub use orchestrator::{AttemptOutcome, Orchestrator, PagePhase, run_crawl};

// Re-export crawler types
pub use crawler::{RedirectCrawler, crawl};
pub use crawl_types::{CrawlError, CrawlResult, Crawler};

// Re-export the pure decision helpers
pub use cleanup::{CleanupResult, ShutdownStep};
pub use link_processor::{AnchorHandle, RejectReason, check_href, filter_candidates};
pub use navigation::NavigationProbe;
pub use page_enhancer::{Admission, admit, is_decorative};
pub use pending_signals::{MidAttempt, PendingSignals, route_mid_attempt};
pub use tab_triage::{TabDecision, classify_tab};
