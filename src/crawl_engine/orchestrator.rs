//! Navigation orchestrator
//!
//! One run follows one navigation lineage in the browser's main tab. The
//! orchestrator is the only consumer of browser signals and the only writer of
//! the crawl state, so every log mutation happens here, in signal order.
//!
//! Per page the orchestrator moves through `Navigating -> Settled ->
//! AttemptingLink` and back to `Navigating` after a successful click, or to
//! `Done` when no link is left. The global deadline ends the run from any
//! phase.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::target::EventTargetCreated;
use futures::StreamExt;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::task::JoinHandle;

use super::cleanup::{CleanupResult, graceful_shutdown};
use super::crawl_types::{CrawlError, CrawlResult};
use super::link_processor::{AnchorHandle, discover_candidates, retarget_anchors};
use super::navigation::{NavigationProbe, click_anchor, current_url, navigate_to, wait_for_navigation};
use super::page_enhancer::{PageInstrumentation, instrument_page, measure_viewport, page_key};
use super::page_timeout::with_page_timeout;
use super::pending_signals::{MidAttempt, PendingSignals, route_mid_attempt};
use super::tab_triage::{TabDecision, classify_tab, find_page, resolve_tab_url};
use crate::browser_setup::{LaunchedBrowser, launch_browser};
use crate::config::CrawlConfig;
use crate::crawl_events::{
    BrowserSignal, CdpFrameId, CrawlEvent, FrameKey, NavigationRecord, PageKey, ShutdownReason,
    SignalReceiver, SignalSender, signal_channel,
};
use crate::crawl_state::CrawlState;
use crate::utils::{SHUTDOWN_STEP_TIMEOUT_MS, is_http_url};

/// How long a new tab gets to show up in the driver and pick a URL
const TAB_ATTACH_WAIT: Duration = Duration::from_secs(2);

/// Phase of the main page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    /// Loading; waiting for the quiescence timer
    Navigating,
    /// Quiet for a full settle window
    Settled,
    /// Clicking through the candidate list
    AttemptingLink,
    Done,
}

/// Result of one manual navigation round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A click moved the page
    Navigated { requested: String, resolved: String },
    /// Nothing on the page could be followed
    Exhausted,
    /// A shutdown signal arrived while links were being tried
    Stopped(ShutdownReason),
}

/// Result of clicking one anchor
enum ClickOutcome {
    Navigated(String),
    Stopped(ShutdownReason),
}

/// Owns the browser session and the crawl state for one run
pub struct Orchestrator {
    config: CrawlConfig,
    launched: Option<LaunchedBrowser>,
    main_page: Page,
    main_key: PageKey,
    main_frame: CdpFrameId,
    main_frame_id: FrameKey,
    state: CrawlState,
    signals: SignalSender,
    receiver: SignalReceiver,
    /// Signals that arrived during a click wait and must be handled afterwards
    deferred: PendingSignals,
    instrumentation: PageInstrumentation,
    tab_listener: Option<JoinHandle<()>>,
    seed_navigation: Option<JoinHandle<()>>,
    phase: PagePhase,
    settle_generation: u64,
}

impl Orchestrator {
    /// Launch the browser and attach to its main tab
    ///
    /// Failure here is fatal; a browser that did launch is shut down again
    /// before the error is returned.
    pub async fn start(config: CrawlConfig) -> CrawlResult<Self> {
        let launched = launch_browser(&config)
            .await
            .map_err(|e| CrawlError::BrowserError(format!("{e:#}")))?;

        match Self::attach(config.clone(), &launched).await {
            Ok(parts) => Ok(parts.into_orchestrator(config, launched)),
            Err(e) => {
                let step_timeout = Duration::from_millis(SHUTDOWN_STEP_TIMEOUT_MS);
                graceful_shutdown(launched, None, Duration::ZERO, step_timeout).await;
                Err(CrawlError::BrowserError(format!("{e:#}")))
            }
        }
    }

    async fn attach(config: CrawlConfig, launched: &LaunchedBrowser) -> Result<AttachedParts> {
        let (signals, receiver) = signal_channel();

        let main_page = launched
            .browser
            .new_page("about:blank")
            .await
            .context("Failed to open main tab")?;
        let main_key = page_key(&main_page);
        let main_frame = main_page
            .mainframe()
            .await
            .context("Failed to look up main frame")?
            .map_or_else(|| main_key.clone(), |frame| frame.inner().clone());

        let mut targets = launched
            .browser
            .event_listener::<EventTargetCreated>()
            .await
            .context("Failed to listen for new tabs")?;
        let tab_signals = signals.clone();
        let tab_listener = tokio::spawn(async move {
            while let Some(event) = targets.next().await {
                if event.target_info.r#type != "page" {
                    continue;
                }
                let target = event.target_info.target_id.inner().clone();
                if tab_signals
                    .publish(BrowserSignal::TabOpened { target })
                    .is_err()
                {
                    break;
                }
            }
        });

        let instrumentation = match instrument_page(
            &main_page,
            signals.clone(),
            config.viewport(),
            config.block_images(),
        )
        .await
        {
            Ok(instrumentation) => instrumentation,
            Err(e) => {
                tab_listener.abort();
                return Err(e);
            }
        };

        Ok(AttachedParts {
            main_page,
            main_key,
            main_frame,
            signals,
            receiver,
            instrumentation,
            tab_listener,
        })
    }

    #[must_use]
    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// `<frameId>:<url>:` prefix for log lines about the main frame
    async fn desc(&self) -> String {
        let url = current_url(&self.main_page).await.unwrap_or_default();
        format!("{}:{url}:", self.main_frame_id)
    }

    /// Run the crawl to completion and return the ordered log
    pub async fn run(mut self) -> Vec<CrawlEvent> {
        let deadline = self.config.deadline();
        let deadline_signals = self.signals.clone();
        self.state.set_global_timeout(
            move || {
                let _ = deadline_signals.publish(BrowserSignal::DeadlineReached);
            },
            deadline,
        );

        self.visit_seed();
        let reason = self.event_loop().await;
        self.shutdown(reason).await
    }

    /// Log the seed navigation and start loading it in the background
    ///
    /// A slow or failing seed does not end the run; the load listeners and
    /// the global deadline decide what happens next.
    fn visit_seed(&mut self) {
        let url = self.config.start_url().to_string();
        info!(target: "redirect_recorder::navigation", "Starting crawl at {url}");
        self.state.push_navigation(NavigationRecord {
            frame_id: self.main_frame_id,
            url: url.clone(),
        });
        self.phase = PagePhase::Navigating;

        let page = self.main_page.clone();
        let limit = self.config.deadline();
        self.seed_navigation = Some(tokio::spawn(async move {
            if let Err(e) = navigate_to(&page, &url, limit).await {
                warn!(target: "redirect_recorder::navigation", "Seed navigation did not complete: {e:#}");
            }
        }));
    }

    async fn next_signal(&mut self) -> Option<BrowserSignal> {
        if let Some(signal) = self.deferred.pop() {
            return Some(signal);
        }
        self.receiver.recv().await
    }

    async fn event_loop(&mut self) -> ShutdownReason {
        loop {
            let Some(signal) = self.next_signal().await else {
                return ShutdownReason::BrowserClosed;
            };
            if let Some(reason) = self.handle_signal(signal).await {
                return reason;
            }
        }
    }

    /// React to one signal; `Some` ends the run
    async fn handle_signal(&mut self, signal: BrowserSignal) -> Option<ShutdownReason> {
        match signal {
            BrowserSignal::QuiescenceElapsed { page, generation } => {
                if page != self.main_key || generation != self.settle_generation {
                    return None;
                }
                self.on_settled().await
            }
            BrowserSignal::DeadlineReached => {
                info!(target: "redirect_recorder::navigation", "Global crawling time limit hit");
                Some(ShutdownReason::DeadlineReached)
            }
            BrowserSignal::ListenerClosed { listener } => {
                warn!(target: "redirect_recorder::navigation", "The {listener} listener stopped");
                Some(ShutdownReason::BrowserClosed)
            }
            other => {
                self.absorb(other).await;
                None
            }
        }
    }

    /// Signals that are safe to handle at any time, including mid-attempt
    async fn absorb(&mut self, signal: BrowserSignal) {
        match signal {
            BrowserSignal::DocumentRequest {
                page,
                frame,
                url,
                server_redirect,
            } => {
                if page != self.main_key {
                    return;
                }
                let frame_id = self.state.frame_id(&frame);
                let is_iframe = frame != self.main_frame;
                let outcome = self
                    .state
                    .observe_document_request(&url, frame_id, is_iframe, server_redirect);
                debug!(
                    target: "redirect_recorder::router",
                    "{frame_id}:{url}: document request ({outcome:?})"
                );
            }
            BrowserSignal::DocumentLoaded { page } => {
                if page == self.main_key {
                    self.on_document_loaded().await;
                }
            }
            BrowserSignal::FrameDetached { frame } => {
                if frame != self.main_frame {
                    self.state.forget_frame(&frame);
                }
            }
            BrowserSignal::TabOpened { target } => {
                if target != self.main_key {
                    self.triage_tab(&target).await;
                }
            }
            deferred @ (BrowserSignal::QuiescenceElapsed { .. }
            | BrowserSignal::DeadlineReached
            | BrowserSignal::ListenerClosed { .. }) => self.deferred.push(deferred),
        }
    }

    /// Every load restarts the settle countdown, error pages included
    async fn on_document_loaded(&mut self) {
        let url = current_url(&self.main_page).await.unwrap_or_default();
        if is_http_url(&url) {
            self.state.mark_first_page_loaded();
            self.state.add_visited_domain(&url);
        }
        debug!(target: "redirect_recorder::navigation", "{}:{url}: domcontentloaded", self.main_frame_id);
        if self.phase != PagePhase::AttemptingLink {
            self.phase = PagePhase::Navigating;
        }
        self.arm_quiescence_timer();
    }

    /// (Re)start the settle countdown for the main page
    fn arm_quiescence_timer(&mut self) {
        self.settle_generation += 1;
        let generation = self.settle_generation;
        let page = self.main_key.clone();
        let signals = self.signals.clone();
        self.state.set_timeout_for_page(
            &self.main_key,
            move || {
                let _ = signals.publish(BrowserSignal::QuiescenceElapsed { page, generation });
            },
            self.config.settle_window(),
        );
    }

    async fn on_settled(&mut self) -> Option<ShutdownReason> {
        self.phase = PagePhase::Settled;
        let desc = self.desc().await;
        debug!(target: "redirect_recorder::navigation", "{desc}Completing timeout for navigation");

        match self.manual_navigation().await {
            Ok(AttemptOutcome::Navigated { requested, resolved }) => {
                info!(
                    target: "redirect_recorder::navigation",
                    "Navigated to {resolved} (clicked {requested})"
                );
                self.phase = PagePhase::Navigating;
                None
            }
            Ok(AttemptOutcome::Exhausted) => {
                self.phase = PagePhase::Done;
                Some(ShutdownReason::LinksExhausted)
            }
            Ok(AttemptOutcome::Stopped(reason)) => {
                self.phase = PagePhase::Done;
                Some(reason)
            }
            Err(e) => {
                warn!(target: "redirect_recorder::navigation", "Navigation attempt failed: {e:#}");
                self.phase = PagePhase::Done;
                Some(ShutdownReason::NavigationFailed(format!("{e:#}")))
            }
        }
    }

    /// Discover candidates and click through them until one navigates
    pub async fn manual_navigation(&mut self) -> Result<AttemptOutcome> {
        let desc = self.desc().await;
        let step_timeout = Duration::from_millis(SHUTDOWN_STEP_TIMEOUT_MS);

        if let Err(e) = with_page_timeout(retarget_anchors(&self.main_page), step_timeout, "retarget anchors").await {
            debug!(target: "redirect_recorder::links", "{desc}could not retarget anchors: {e:#}");
        }

        let candidates = with_page_timeout(
            discover_candidates(
                &self.main_page,
                self.state.visited_domains(),
                self.config.follow_local_links(),
                &desc,
            ),
            step_timeout,
            "link discovery",
        )
        .await?;

        if candidates.is_empty() {
            info!(
                target: "redirect_recorder::navigation",
                "{desc}not navigating further, no links on page to manually visit"
            );
            return Ok(AttemptOutcome::Exhausted);
        }

        self.phase = PagePhase::AttemptingLink;
        let initial_url = current_url(&self.main_page).await.unwrap_or_default();
        let probe = NavigationProbe::new(&initial_url, self.config.follow_local_links());

        for anchor in candidates {
            if let Some(reason) = self.drain_ready().await {
                info!(target: "redirect_recorder::navigation", "{desc}Giving up on links: {reason}");
                return Ok(AttemptOutcome::Stopped(reason));
            }

            debug!(target: "redirect_recorder::navigation", "{desc}About to click link for {}", anchor.href);
            self.state.register_navigation_attempt(NavigationRecord {
                frame_id: self.main_frame_id,
                url: anchor.href.clone(),
            })?;

            match self.attempt_click(&anchor, &probe).await {
                Ok(ClickOutcome::Navigated(resolved)) => {
                    debug!(target: "redirect_recorder::navigation", "{desc}Navigating worked");
                    self.state.commit_navigation_attempt(Some(&resolved));
                    return Ok(AttemptOutcome::Navigated {
                        requested: anchor.href,
                        resolved,
                    });
                }
                Ok(ClickOutcome::Stopped(reason)) => {
                    info!(
                        target: "redirect_recorder::navigation",
                        "{desc}Abandoning click on {}: {reason}",
                        anchor.href
                    );
                    self.state.rollback_navigation_attempt();
                    return Ok(AttemptOutcome::Stopped(reason));
                }
                Err(e) => {
                    debug!(
                        target: "redirect_recorder::navigation",
                        "{desc}Clicking {} did not navigate page: {e:#}",
                        anchor.href
                    );
                    self.state.rollback_navigation_attempt();
                }
            }
        }

        info!(target: "redirect_recorder::navigation", "{desc}Could not find any valid anchors");
        Ok(AttemptOutcome::Exhausted)
    }

    /// Handle whatever is already queued, reporting a requested shutdown
    async fn drain_ready(&mut self) -> Option<ShutdownReason> {
        while let Some(signal) = self.receiver.try_recv() {
            match route_mid_attempt(signal) {
                MidAttempt::Absorb(signal) => self.absorb(signal).await,
                MidAttempt::Defer(signal) => self.deferred.push(signal),
                MidAttempt::Stop(reason) => return Some(reason),
            }
        }
        self.deferred.pending_stop()
    }

    /// Click one anchor and wait for the page to move, absorbing signals meanwhile
    ///
    /// The deadline or a lost connection cuts the wait short.
    async fn attempt_click(&mut self, anchor: &AnchorHandle, probe: &NavigationProbe) -> Result<ClickOutcome> {
        let page = self.main_page.clone();
        let click_wait = self.config.click_wait();
        let poll_interval = self.config.click_poll_interval();

        let attempt = async {
            with_page_timeout(click_anchor(&page, anchor), click_wait, "anchor click").await?;
            let reached = tokio::time::timeout(click_wait, wait_for_navigation(&page, probe, poll_interval))
                .await
                .map_err(|_| anyhow::anyhow!("page did not navigate within {}ms", click_wait.as_millis()))?;
            Ok::<String, anyhow::Error>(reached)
        };
        tokio::pin!(attempt);

        loop {
            tokio::select! {
                reached = &mut attempt => return reached.map(ClickOutcome::Navigated),
                signal = self.receiver.recv() => match signal.map(route_mid_attempt) {
                    Some(MidAttempt::Absorb(signal)) => self.absorb(signal).await,
                    Some(MidAttempt::Defer(signal)) => self.deferred.push(signal),
                    Some(MidAttempt::Stop(reason)) => return Ok(ClickOutcome::Stopped(reason)),
                    None => return Ok(ClickOutcome::Stopped(ShutdownReason::BrowserClosed)),
                },
            }
        }
    }

    /// Merge a full-size tab into the main lineage, close anything smaller
    async fn triage_tab(&mut self, target: &str) {
        let main_viewport = self.config.viewport();
        let min = self.config.full_page_min();
        let poll = self.config.click_poll_interval();

        if classify_tab(self.state.have_loaded_first_page(), main_viewport, main_viewport, min)
            == TabDecision::Ignore
        {
            debug!(target: "redirect_recorder::tabs", "Ignoring tab {target} opened before first load");
            return;
        }

        let Some(browser) = self.launched.as_ref().map(|l| &l.browser) else {
            return;
        };
        let tab = match find_page(browser, target, TAB_ATTACH_WAIT, poll).await {
            Ok(tab) => tab,
            Err(e) => {
                debug!(target: "redirect_recorder::tabs", "New tab {target} not usable: {e:#}");
                return;
            }
        };

        let tab_viewport = match measure_viewport(&tab).await {
            Ok(viewport) => viewport,
            Err(e) => {
                debug!(target: "redirect_recorder::tabs", "Could not measure tab {target}: {e:#}");
                let _ = tab.close().await;
                return;
            }
        };

        match classify_tab(true, main_viewport, tab_viewport, min) {
            TabDecision::Close => {
                info!(
                    target: "redirect_recorder::tabs",
                    "Closing tab {target}: not a full page tab (main window {main_viewport}, new window {tab_viewport})"
                );
                if let Err(e) = tab.close().await {
                    debug!(target: "redirect_recorder::tabs", "Tab {target} already closed: {e}");
                }
            }
            TabDecision::Merge => {
                let url = resolve_tab_url(&tab, TAB_ATTACH_WAIT, poll).await;
                if let Err(e) = tab.close().await {
                    debug!(target: "redirect_recorder::tabs", "Tab {target} already closed: {e}");
                }
                let Some(url) = url else {
                    debug!(target: "redirect_recorder::tabs", "Tab {target} never reached an HTTP URL");
                    return;
                };
                info!(target: "redirect_recorder::tabs", "New tab opened for {url}, following it in the main tab");

                // An open attempt records the move itself when it commits
                if !self.state.is_attempt_active() {
                    self.state.push_navigation(NavigationRecord {
                        frame_id: self.main_frame_id,
                        url: url.clone(),
                    });
                }
                if let Err(e) = navigate_to(&self.main_page, &url, self.config.click_wait()).await {
                    warn!(target: "redirect_recorder::tabs", "Following tab to {url} failed: {e:#}");
                }
            }
            TabDecision::Ignore => {}
        }
    }

    /// Close the state, tear the browser down and hand back the log
    async fn shutdown(mut self, reason: ShutdownReason) -> Vec<CrawlEvent> {
        info!(target: "redirect_recorder::navigation", "Ending crawl: {reason}");
        self.phase = PagePhase::Done;
        self.state.close();
        self.receiver.shutdown();
        if let Some(listener) = self.tab_listener.take() {
            listener.abort();
        }
        if let Some(seed) = self.seed_navigation.take() {
            seed.abort();
        }

        if let Some(launched) = self.launched.take() {
            let step_timeout = Duration::from_millis(SHUTDOWN_STEP_TIMEOUT_MS);
            let result = graceful_shutdown(
                launched,
                Some(self.main_page.clone()),
                self.config.shutdown_grace(),
                step_timeout,
            )
            .await;
            if let CleanupResult::PartialFailure(errors) = result {
                warn!(
                    target: "redirect_recorder::cleanup",
                    "Shutdown finished with {} swallowed error(s)",
                    errors.len()
                );
            }
        }
        self.instrumentation.detach();

        self.state.events_snapshot()
    }
}

/// Browser-side pieces produced while attaching to the main tab
struct AttachedParts {
    main_page: Page,
    main_key: PageKey,
    main_frame: CdpFrameId,
    signals: SignalSender,
    receiver: SignalReceiver,
    instrumentation: PageInstrumentation,
    tab_listener: JoinHandle<()>,
}

impl AttachedParts {
    fn into_orchestrator(self, config: CrawlConfig, launched: LaunchedBrowser) -> Orchestrator {
        let mut state = CrawlState::new();
        let main_frame_id = state.frame_id(&self.main_frame);
        Orchestrator {
            config,
            launched: Some(launched),
            main_page: self.main_page,
            main_key: self.main_key,
            main_frame: self.main_frame,
            main_frame_id,
            state,
            signals: self.signals,
            receiver: self.receiver,
            deferred: PendingSignals::default(),
            instrumentation: self.instrumentation,
            tab_listener: Some(self.tab_listener),
            seed_navigation: None,
            phase: PagePhase::Navigating,
            settle_generation: 0,
        }
    }
}

/// Launch, crawl, shut down. Only a launch failure is an error.
pub async fn run_crawl(config: CrawlConfig) -> CrawlResult<Vec<CrawlEvent>> {
    let orchestrator = Orchestrator::start(config).await?;
    Ok(orchestrator.run().await)
}
