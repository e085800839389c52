//! Manual click-through navigation
//!
//! A click is fired inside the anchor's own frame, then the page is polled
//! until its location moves. What "moves" means depends on the run: normally
//! the host must change, in local fixture mode any change of URL counts.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{FrameId, NavigateParams};
use std::time::Duration;

use super::link_processor::{AnchorHandle, evaluate_in_frame};
use super::page_timeout::with_page_timeout;
use crate::utils::host_of;

/// Predicate for "the click navigated the page"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationProbe {
    initial_url: String,
    initial_host: Option<String>,
    follow_local_links: bool,
}

impl NavigationProbe {
    #[must_use]
    pub fn new(initial_url: &str, follow_local_links: bool) -> Self {
        Self {
            initial_url: initial_url.to_string(),
            initial_host: host_of(initial_url),
            follow_local_links,
        }
    }

    #[must_use]
    pub fn has_navigated(&self, current_url: &str) -> bool {
        if self.follow_local_links {
            return current_url != self.initial_url;
        }
        host_of(current_url) != self.initial_host
    }
}

/// Click an anchor found during discovery
///
/// Fails if the anchor is gone from its frame or the frame itself is gone.
pub async fn click_anchor(page: &Page, anchor: &AnchorHandle) -> Result<()> {
    let selector = serde_json::to_string(&anchor.selector())?;
    let expression = format!(
        r#"(() => {{
            const anchor = document.querySelector({selector});
            if (!anchor) {{
                return false;
            }}
            anchor.click();
            return true;
        }})()"#
    );

    let frame = FrameId::new(anchor.frame.clone());
    let clicked: bool = evaluate_in_frame(page, &frame, expression).await?;
    if clicked {
        Ok(())
    } else {
        Err(anyhow::anyhow!("Anchor for {} is no longer in the document", anchor.href))
    }
}

/// Current top-level URL, if the page can tell
pub async fn current_url(page: &Page) -> Option<String> {
    page.url().await.ok().flatten()
}

/// Poll until `probe` reports a navigation, returning the URL reached
///
/// Callers bound this with their own timeout.
pub async fn wait_for_navigation(
    page: &Page,
    probe: &NavigationProbe,
    poll_interval: Duration,
) -> String {
    let mut ticker = tokio::time::interval(poll_interval);
    loop {
        ticker.tick().await;
        if let Some(url) = current_url(page).await
            && probe.has_navigated(&url)
        {
            return url;
        }
    }
}

/// Send the page somewhere without waiting for the load to finish
///
/// Load progress is observed through the page's listeners, not here.
pub async fn navigate_to(page: &Page, url: &str, timeout: Duration) -> Result<()> {
    with_page_timeout(
        async {
            page.execute(NavigateParams::new(url))
                .await
                .with_context(|| format!("Navigation to {url} failed"))?;
            Ok(())
        },
        timeout,
        "navigate",
    )
    .await
}
