//! Link discovery and candidate selection
//!
//! Every frame of the active page is scanned for laid-out anchors. Each one is
//! tagged with a token attribute so it can be found and clicked again later
//! inside the same frame. The hrefs are then filtered against the crawl-wide
//! visited set and shuffled.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::FrameId;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use log::{debug, warn};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::crawl_events::CdpFrameId;
use crate::crawl_state::VisitedDomainSet;
use crate::utils::{
    ANCHOR_TOKEN_ATTR, IGNORED_FILE_EXTENSIONS, MIN_HREF_LEN, domain_of, file_extension_of,
    is_http_url,
};

static DISCOVERY_PASS: AtomicU64 = AtomicU64::new(0);

/// A clickable anchor found during discovery
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnchorHandle {
    /// Frame the anchor lives in
    #[serde(default)]
    pub frame: CdpFrameId,
    /// Value of the token attribute set on the element
    pub token: String,
    /// Fully resolved href as the browser reports it
    #[serde(default)]
    pub href: String,
}

impl AnchorHandle {
    /// CSS selector that finds this anchor again inside its frame
    #[must_use]
    pub fn selector(&self) -> String {
        format!("a[{ANCHOR_TOKEN_ATTR}=\"{}\"]", self.token)
    }
}

/// Why an anchor was dropped; only used for trace logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooShort,
    NotHttp,
    IgnoredExtension,
    NoDomain,
    DuplicateDomain,
    VisitedDomain,
}

/// Decide whether a single href is worth clicking
///
/// `seen_in_pass` holds the domains already accepted in this discovery pass;
/// an accepted href's domain is added to it.
pub fn check_href(
    href: &str,
    visited: &VisitedDomainSet,
    seen_in_pass: &mut HashSet<String>,
) -> Result<(), RejectReason> {
    if href.len() < MIN_HREF_LEN {
        return Err(RejectReason::TooShort);
    }
    if !is_http_url(href) {
        return Err(RejectReason::NotHttp);
    }
    if let Some(ext) = file_extension_of(href)
        && IGNORED_FILE_EXTENSIONS.contains(&ext.as_str())
    {
        return Err(RejectReason::IgnoredExtension);
    }
    let Some(domain) = domain_of(href) else {
        return Err(RejectReason::NoDomain);
    };
    if seen_in_pass.contains(&domain) {
        return Err(RejectReason::DuplicateDomain);
    }
    if !visited.is_new(href) {
        return Err(RejectReason::VisitedDomain);
    }
    seen_in_pass.insert(domain);
    Ok(())
}

/// Keep the anchors worth clicking, first anchor per domain wins
///
/// With `follow_local_links` every anchor is kept; local fixtures all share
/// one host and would otherwise be filtered out.
#[must_use]
pub fn filter_candidates(
    anchors: Vec<AnchorHandle>,
    visited: &VisitedDomainSet,
    follow_local_links: bool,
) -> Vec<AnchorHandle> {
    if follow_local_links {
        return anchors;
    }

    let mut seen_in_pass = HashSet::new();
    anchors
        .into_iter()
        .filter(|anchor| match check_href(&anchor.href, visited, &mut seen_in_pass) {
            Ok(()) => true,
            Err(reason) => {
                log::trace!(
                    target: "redirect_recorder::links",
                    "Skipping {}: {reason:?}",
                    anchor.href
                );
                false
            }
        })
        .collect()
}

/// Randomize visitation order in place
pub fn shuffle_candidates(candidates: &mut [AnchorHandle]) {
    candidates.shuffle(&mut rand::rng());
}

/// Evaluate `expression` inside a specific frame and deserialize the result
pub(crate) async fn evaluate_in_frame<T: DeserializeOwned>(
    page: &Page,
    frame: &FrameId,
    expression: String,
) -> Result<T> {
    let context_id = page
        .frame_execution_context(frame.clone())
        .await
        .context("Failed to look up frame execution context")?
        .with_context(|| format!("Frame {} has no execution context", frame.inner()))?;

    let params = EvaluateParams::builder()
        .expression(expression)
        .context_id(context_id)
        .return_by_value(true)
        .await_promise(true)
        .build()
        .map_err(anyhow::Error::msg)?;

    let result = page
        .evaluate_expression(params)
        .await
        .context("Frame evaluation failed")?;
    result
        .into_value::<T>()
        .context("Unexpected value returned from frame evaluation")
}

/// Point every `target`ed anchor at the current browsing context
///
/// Clicks on such anchors would otherwise open a new tab and escape the main
/// lineage. Frames that cannot be evaluated are skipped.
pub async fn retarget_anchors(page: &Page) -> Result<()> {
    let frames = page.frames().await.context("Failed to list page frames")?;
    for frame in frames {
        let expression = r#"(() => {
            const anchors = Array.from(document.querySelectorAll("a[target]"));
            anchors.forEach(a => { a.target = "_self"; });
            return anchors.length;
        })()"#
            .to_string();
        if let Err(e) = evaluate_in_frame::<u64>(page, &frame, expression).await {
            debug!(
                target: "redirect_recorder::links",
                "Could not retarget anchors in frame {}: {e:#}",
                frame.inner()
            );
        }
    }
    Ok(())
}

fn tag_anchors_script(pass: u64) -> String {
    format!(
        r#"(() => {{
            const found = [];
            let index = 0;
            for (const anchor of document.querySelectorAll("a")) {{
                if (anchor.getClientRects().length === 0) {{
                    continue;
                }}
                const token = "{pass}-" + index++;
                anchor.setAttribute("{ANCHOR_TOKEN_ATTR}", token);
                found.push({{ token, href: typeof anchor.href === "string" ? anchor.href : "" }});
            }}
            return found;
        }})()"#
    )
}

/// Scan every frame of `page` for laid-out anchors, tagging each one
async fn collect_anchors(page: &Page, desc: &str) -> Result<Vec<AnchorHandle>> {
    let pass = DISCOVERY_PASS.fetch_add(1, Ordering::Relaxed);
    let frames = page.frames().await.context("Failed to list page frames")?;

    let mut anchors = Vec::new();
    for frame in frames {
        match evaluate_in_frame::<Vec<AnchorHandle>>(page, &frame, tag_anchors_script(pass)).await
        {
            Ok(found) => anchors.extend(found.into_iter().map(|mut anchor| {
                anchor.frame = frame.inner().clone();
                anchor
            })),
            Err(e) => warn!(
                target: "redirect_recorder::links",
                "{desc}skipping frame {} during discovery: {e:#}",
                frame.inner()
            ),
        }
    }
    Ok(anchors)
}

/// Candidate anchors for the next manual navigation, in shuffled order
///
/// An empty result is a normal outcome: the page has nothing new to offer.
pub async fn discover_candidates(
    page: &Page,
    visited: &VisitedDomainSet,
    follow_local_links: bool,
    desc: &str,
) -> Result<Vec<AnchorHandle>> {
    let anchors = collect_anchors(page, desc).await?;
    let total = anchors.len();

    let mut candidates = filter_candidates(anchors, visited, follow_local_links);
    let hrefs: Vec<&str> = candidates.iter().map(|a| a.href.as_str()).collect();
    debug!(
        target: "redirect_recorder::links",
        "{desc}found links: {hrefs:?} ({total} visible anchors)"
    );

    shuffle_candidates(&mut candidates);
    Ok(candidates)
}
