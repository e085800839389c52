//! Page instrumentation and the request router
//!
//! Attaching to a page pins its viewport, turns on request interception and
//! spawns the listener tasks that turn CDP events into `BrowserSignal`s. The
//! request listener answers every paused request itself, so the page keeps
//! loading even while the orchestrator is busy waiting on a click.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, EventFrameDetached};
use futures::StreamExt;
use log::{debug, trace, warn};
use tokio::task::JoinHandle;

use crate::config::Viewport;
use crate::crawl_events::{BrowserSignal, PageKey, SignalSender};
use crate::utils::is_http_url;

/// What the router does with one outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Never fetched, never logged
    Abort,
    /// Fetched but not logged
    Continue,
    /// Fetched and logged as a document request
    Log,
}

/// Resource types that only affect presentation and are never fetched
#[must_use]
pub fn is_decorative(resource_type: &ResourceType, block_images: bool) -> bool {
    match resource_type {
        ResourceType::Font => true,
        ResourceType::Image => block_images,
        _ => false,
    }
}

/// Admission policy, checked in order: non-HTTP schemes and decorative
/// resources are aborted, non-document resources pass silently, documents
/// are logged.
#[must_use]
pub fn admit(url: &str, resource_type: &ResourceType, block_images: bool) -> Admission {
    if !is_http_url(url) {
        return Admission::Abort;
    }
    if is_decorative(resource_type, block_images) {
        return Admission::Abort;
    }
    if *resource_type != ResourceType::Document {
        return Admission::Continue;
    }
    Admission::Log
}

/// Stable key for a page: its CDP target id
#[must_use]
pub fn page_key(page: &Page) -> PageKey {
    page.target_id().inner().clone()
}

/// Listener tasks attached to one page
#[derive(Debug, Default)]
pub struct PageInstrumentation {
    listeners: Vec<JoinHandle<()>>,
}

impl PageInstrumentation {
    /// Stop every listener for this page
    pub fn detach(&mut self) {
        for handle in self.listeners.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for PageInstrumentation {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Pin the page's viewport so tab-size comparisons have a fixed reference
pub async fn set_viewport(page: &Page, viewport: Viewport) -> Result<()> {
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(viewport.width))
            .height(i64::from(viewport.height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await
    .context("Failed to set viewport")?;
    Ok(())
}

/// The viewport a page actually renders at
pub async fn measure_viewport(page: &Page) -> Result<Viewport> {
    page.evaluate("({ width: window.innerWidth, height: window.innerHeight })")
        .await
        .context("Failed to read page viewport")?
        .into_value::<Viewport>()
        .context("Unexpected viewport value")
}

/// Attach the request router and load listeners to `page`
///
/// Listeners are registered before interception is enabled so no paused
/// request can slip past unanswered.
pub async fn instrument_page(
    page: &Page,
    signals: SignalSender,
    viewport: Viewport,
    block_images: bool,
) -> Result<PageInstrumentation> {
    let key = page_key(page);
    debug!(target: "redirect_recorder::router", "{key}: (re)setting page instrumentation");

    set_viewport(page, viewport).await?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to listen for paused requests")?;
    let mut loaded = page
        .event_listener::<EventDomContentEventFired>()
        .await
        .context("Failed to listen for DOMContentLoaded")?;
    let mut detached = page
        .event_listener::<EventFrameDetached>()
        .await
        .context("Failed to listen for frame detach")?;

    let mut instrumentation = PageInstrumentation::default();

    // Request router
    {
        let page = page.clone();
        let signals = signals.clone();
        let key = key.clone();
        instrumentation.listeners.push(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = event.request.url.clone();
                let admission = admit(&url, &event.resource_type, block_images);
                trace!(
                    target: "redirect_recorder::router",
                    "{key}: {:?} request to {url} -> {admission:?}",
                    event.resource_type
                );

                if admission == Admission::Log {
                    let _ = signals.publish(BrowserSignal::DocumentRequest {
                        page: key.clone(),
                        frame: event.frame_id.inner().clone(),
                        url: url.clone(),
                        server_redirect: event.redirected_request_id.is_some(),
                    });
                }

                let answer = match admission {
                    Admission::Abort => page
                        .execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ()),
                    Admission::Continue | Admission::Log => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                };
                if let Err(e) = answer {
                    // Requests of a page being torn down can no longer be answered
                    trace!(target: "redirect_recorder::router", "{key}: unanswered request {url}: {e}");
                }
            }
            let _ = signals.publish(BrowserSignal::ListenerClosed { listener: "request" });
        }));
    }

    // DOMContentLoaded of the top frame
    {
        let signals = signals.clone();
        let key = key.clone();
        instrumentation.listeners.push(tokio::spawn(async move {
            while loaded.next().await.is_some() {
                if signals
                    .publish(BrowserSignal::DocumentLoaded { page: key.clone() })
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    // Frame detach, so the registry can forget frames
    {
        let signals = signals.clone();
        instrumentation.listeners.push(tokio::spawn(async move {
            while let Some(event) = detached.next().await {
                if signals
                    .publish(BrowserSignal::FrameDetached {
                        frame: event.frame_id.inner().clone(),
                    })
                    .is_err()
                {
                    break;
                }
            }
        }));
    }

    let pattern = RequestPattern::builder()
        .url_pattern("*")
        .request_stage(RequestStage::Request)
        .build();
    if let Err(e) = page
        .execute(EnableParams::builder().pattern(pattern).build())
        .await
    {
        instrumentation.detach();
        warn!(target: "redirect_recorder::router", "{key}: failed to enable interception: {e}");
        return Err(e).context("Failed to enable request interception");
    }

    Ok(instrumentation)
}
