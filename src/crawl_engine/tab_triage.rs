//! New-tab triage
//!
//! A tab that shows up after the first page load is either a full-size page
//! (merged into the main lineage: the main page follows it and the tab is
//! closed) or a popup (closed, never logged).

use anyhow::{Context, Result};
use chromiumoxide::{Browser, Page};
use log::debug;
use std::time::Duration;

use super::page_enhancer::page_key;
use crate::config::Viewport;
use crate::utils::is_http_url;

/// What to do with a freshly opened tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDecision {
    /// Opened before the first page load; leave it alone
    Ignore,
    /// Full-size tab: navigate the main page to its URL, then close it
    Merge,
    /// Popup: close it
    Close,
}

/// Classify a new tab by its size relative to the main page
#[must_use]
pub fn classify_tab(
    have_loaded_first_page: bool,
    main: Viewport,
    new: Viewport,
    full_page_min: Viewport,
) -> TabDecision {
    if !have_loaded_first_page {
        return TabDecision::Ignore;
    }
    if new == main || new.covers(&full_page_min) {
        TabDecision::Merge
    } else {
        TabDecision::Close
    }
}

/// Find the page handle for a newly created target
///
/// The driver attaches to new targets asynchronously, so the lookup is
/// retried for a short while.
pub async fn find_page(
    browser: &Browser,
    target: &str,
    wait: Duration,
    poll_interval: Duration,
) -> Result<Page> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let pages = browser.pages().await.context("Failed to list browser pages")?;
        if let Some(page) = pages.into_iter().find(|page| page_key(page) == target) {
            return Ok(page);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(anyhow::anyhow!("No page attached for target {target}"));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// URL a new tab is heading to
///
/// Tabs opened by script start on `about:blank` and get their real URL a
/// moment later; wait up to `wait` for an HTTP(S) URL to appear.
pub async fn resolve_tab_url(page: &Page, wait: Duration, poll_interval: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        match page.url().await {
            Ok(Some(url)) if is_http_url(&url) => return Some(url),
            Ok(_) => {}
            Err(e) => {
                debug!(target: "redirect_recorder::tabs", "Could not read tab url: {e}");
                return None;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(poll_interval).await;
    }
}
