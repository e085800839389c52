//! Shared configuration constants for the redirect recorder
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default global crawl deadline: 240 seconds
///
/// Long enough to follow a typical chain of interstitial ad/redirect pages,
/// short enough to fit inside a single function invocation budget.
pub const DEFAULT_CRAWL_SECONDS: u64 = 240;

/// Upper bound accepted for the global crawl deadline
pub const MAX_CRAWL_SECONDS: u64 = 300;

/// Quiescence window: a page is considered settled after this long without a load event
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 3_000;

/// How long a clicked anchor has to move the page before the attempt is rolled back
pub const DEFAULT_CLICK_WAIT_MS: u64 = 6_000;

/// Polling interval for the click-then-navigate predicate
pub const CLICK_POLL_INTERVAL_MS: u64 = 100;

/// Grace period given to the main page for unload handlers during shutdown
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 1_000;

/// Upper bound for each individual best-effort shutdown step
pub const SHUTDOWN_STEP_TIMEOUT_MS: u64 = 5_000;

/// Fixed viewport applied to every instrumented page
///
/// Tall on purpose: pages that hide links below the fold still lay them out,
/// and popup-size comparisons in tab triage need a known reference.
pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 2048;

/// Minimum size for a newly opened tab to count as a full page rather than a popup
pub const FULL_PAGE_MIN_WIDTH: u32 = 800;
pub const FULL_PAGE_MIN_HEIGHT: u32 = 600;

/// Anchors whose resolved href is shorter than this are ignored
pub const MIN_HREF_LEN: usize = 10;

/// Default bucket the finished log is uploaded to
pub const DEFAULT_BUCKET: &str = "com.brave.research.redirections";

/// Domain labels that are never treated as new discoveries
///
/// Matched against the first label of the registrable domain, so every
/// public suffix variant (`google.com`, `google.co.uk`) is covered.
pub const DENYLISTED_DOMAIN_LABELS: &[&str] = &["twitter", "facebook", "instagram", "google"];

/// File extensions that mark an anchor as a download rather than a navigation
pub const IGNORED_FILE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "pdf", "gif", "zip", "gz", "tar", "bz", "doc", "docx", "rtf", "txt",
    "avi", "mov", "mp4", "xls", "xlsx", "dmg", "exe", "wav", "mp3", "aiff",
];

/// Attribute used to tag candidate anchors inside a frame so they can be clicked later
pub const ANCHOR_TOKEN_ATTR: &str = "data-redirect-recorder-anchor";
