//! Event type definitions for the crawl log
//!
//! A finished crawl is an ordered `Vec<CrawlEvent>`. Every entry is either a
//! navigation (an intentional change of a frame's location) or a request (a
//! document fetch observed by the interception layer).

use serde::{Deserialize, Serialize};

/// Stable integer identity of a browser frame for the lifetime of a crawl
pub type FrameKey = u32;

/// One entry of the crawl log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CrawlEvent {
    /// A frame was sent somewhere on purpose: the seed visit, a clicked
    /// anchor, or a full-size tab merged back into the main lineage
    #[serde(rename_all = "camelCase")]
    Navigation {
        timestamp: i64,
        frame_id: FrameKey,
        requested_url: String,
        /// Filled in when the frame ended up somewhere other than requested
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        domain: Option<String>,
    },
    /// A top-level document request issued by a frame
    #[serde(rename_all = "camelCase")]
    Request {
        timestamp: i64,
        frame_id: FrameKey,
        url: String,
        is_i_frame: bool,
        is_redirect_continuation: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        domain: Option<String>,
    },
}

impl CrawlEvent {
    #[must_use]
    pub fn frame_id(&self) -> FrameKey {
        match self {
            Self::Navigation { frame_id, .. } | Self::Request { frame_id, .. } => *frame_id,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Navigation { timestamp, .. } | Self::Request { timestamp, .. } => *timestamp,
        }
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::Navigation { domain, .. } | Self::Request { domain, .. } => domain.as_deref(),
        }
    }

    #[must_use]
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigation { .. })
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Request { .. })
    }

    /// The URL this entry is about: the requested URL for navigations,
    /// the fetched URL for requests
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Navigation { requested_url, .. } => requested_url,
            Self::Request { url, .. } => url,
        }
    }
}

/// A document request as seen by the router, before it is stamped into the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub url: String,
    pub frame_id: FrameKey,
    pub is_iframe: bool,
    pub is_redirect_continuation: bool,
}

/// A navigation as asserted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRecord {
    pub frame_id: FrameKey,
    pub url: String,
}

/// Why a crawl run stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// No further distinct-domain link could be followed
    LinksExhausted,
    /// The global deadline fired
    DeadlineReached,
    /// The settle-driven navigation attempt failed outright
    NavigationFailed(String),
    /// The browser went away underneath the crawl
    BrowserClosed,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinksExhausted => write!(f, "no further links to follow"),
            Self::DeadlineReached => write!(f, "global crawl deadline reached"),
            Self::NavigationFailed(msg) => write!(f, "navigation attempt failed: {msg}"),
            Self::BrowserClosed => write!(f, "browser connection closed"),
        }
    }
}
