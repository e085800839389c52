//! Crawl event log and everything it owns
//!
//! `CrawlState` is the single writer of the crawl log. It owns the frame
//! registry, the visited-domain set, the staged navigation transaction and all
//! timer handles. The orchestrator holds it exclusively; browser callbacks
//! reach it only through the signal channel.

pub mod errors;
pub mod event_log;
pub mod frame_registry;
pub mod timers;
pub mod visited_domains;

use std::collections::HashSet;
use std::time::Duration;

pub use errors::StateError;
pub use event_log::{EventLog, NavigationTransaction, RecordOutcome};
pub use frame_registry::FrameRegistry;
pub use timers::CrawlTimers;
pub use visited_domains::VisitedDomainSet;

use crate::crawl_events::{CrawlEvent, FrameKey, NavigationRecord, RequestRecord};

#[derive(Debug, Default)]
pub struct CrawlState {
    frames: FrameRegistry,
    visited: VisitedDomainSet,
    log: EventLog,
    timers: CrawlTimers,
    /// Frames that already issued a document request since their last navigation
    frames_in_flight: HashSet<FrameKey>,
    /// Whether the attempt frame was in flight before the attempt opened
    in_flight_before_attempt: Option<bool>,
    have_loaded_first_page: bool,
}

impl CrawlState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable integer id for a CDP frame id
    pub fn frame_id(&mut self, frame: &str) -> FrameKey {
        self.frames.id_for(frame)
    }

    pub fn forget_frame(&mut self, frame: &str) {
        if let Some(id) = self.frames.forget(frame) {
            self.frames_in_flight.remove(&id);
        }
    }

    #[must_use]
    pub fn frames(&self) -> &FrameRegistry {
        &self.frames
    }

    /// Log a document request with explicit flags
    pub fn record_request(
        &mut self,
        url: &str,
        frame_id: FrameKey,
        is_iframe: bool,
        is_redirect_continuation: bool,
    ) -> RecordOutcome {
        let outcome = self.log.record_request(RequestRecord {
            url: url.to_string(),
            frame_id,
            is_iframe,
            is_redirect_continuation,
        });
        if outcome != RecordOutcome::Ignored {
            self.frames_in_flight.insert(frame_id);
        }
        log::trace!(
            target: "redirect_recorder::state",
            "{frame_id}:{url}: request {outcome:?}"
        );
        outcome
    }

    /// Log a document request, working out whether it continues a navigation
    ///
    /// A request is a continuation if the browser reports it as a server
    /// redirect, or if its frame already fetched a document since the frame's
    /// last navigation entry (meta refresh and script redirects). Iframes
    /// never get navigation entries, so every document an iframe loads after
    /// its first continues that iframe's chain until the frame detaches.
    pub fn observe_document_request(
        &mut self,
        url: &str,
        frame_id: FrameKey,
        is_iframe: bool,
        server_redirect: bool,
    ) -> RecordOutcome {
        let continuation = server_redirect || self.frames_in_flight.contains(&frame_id);
        self.record_request(url, frame_id, is_iframe, continuation)
    }

    /// Stage a manual navigation before triggering it
    ///
    /// # Errors
    /// `StateError::AttemptAlreadyActive` if an attempt is still open.
    pub fn register_navigation_attempt(&mut self, record: NavigationRecord) -> Result<(), StateError> {
        let frame_id = record.frame_id;
        self.log.register_attempt(record)?;
        self.in_flight_before_attempt = Some(self.frames_in_flight.remove(&frame_id));
        Ok(())
    }

    /// Commit the open attempt. Returns false if none was open.
    pub fn commit_navigation_attempt(&mut self, resolved_url: Option<&str>) -> bool {
        self.in_flight_before_attempt = None;
        let committed = self.log.commit_attempt(resolved_url);
        if committed {
            log::debug!(target: "redirect_recorder::state", "Navigation attempt committed");
        }
        committed
    }

    /// Drop the open attempt and everything it buffered
    pub fn rollback_navigation_attempt(&mut self) {
        let frame_id = match self.log.transaction() {
            NavigationTransaction::ActiveAttempt { frame_id, .. } => Some(*frame_id),
            NavigationTransaction::NoActiveAttempt => None,
        };
        if let Some(dropped) = self.log.rollback_attempt() {
            log::debug!(
                target: "redirect_recorder::state",
                "Navigation attempt rolled back, {dropped} buffered request(s) dropped"
            );
        }
        if let (Some(frame_id), Some(was_in_flight)) = (frame_id, self.in_flight_before_attempt.take()) {
            if was_in_flight {
                self.frames_in_flight.insert(frame_id);
            } else {
                self.frames_in_flight.remove(&frame_id);
            }
        }
    }

    #[must_use]
    pub fn is_attempt_active(&self) -> bool {
        self.log.transaction().is_active()
    }

    /// Append a navigation that was asserted directly rather than staged
    pub fn push_navigation(&mut self, record: NavigationRecord) {
        self.frames_in_flight.remove(&record.frame_id);
        self.log.push_navigation(record);
    }

    #[must_use]
    pub fn is_new_domain(&self, url: &str) -> bool {
        self.visited.is_new(url)
    }

    pub fn add_visited_domain(&mut self, url: &str) -> bool {
        self.visited.add(url)
    }

    #[must_use]
    pub fn visited_domains(&self) -> &VisitedDomainSet {
        &self.visited
    }

    #[must_use]
    pub fn have_loaded_first_page(&self) -> bool {
        self.have_loaded_first_page
    }

    pub fn mark_first_page_loaded(&mut self) {
        self.have_loaded_first_page = true;
    }

    pub fn set_global_timeout<F>(&mut self, callback: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.timers.set_global_timeout(callback, delay);
    }

    pub fn set_timeout_for_page<F>(&mut self, page: &str, callback: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.timers.set_timeout_for_page(page, callback, delay);
    }

    pub fn cancel_timeout_for_page(&mut self, page: &str) -> bool {
        self.timers.cancel_timeout_for_page(page)
    }

    /// Mark the state closed and cancel every timer. Idempotent.
    pub fn close(&mut self) {
        if !self.timers.is_closed() {
            log::debug!(target: "redirect_recorder::state", "Closing crawl state");
        }
        self.timers.close();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.timers.is_closed()
    }

    /// Copy of the log as it stands
    #[must_use]
    pub fn events_snapshot(&self) -> Vec<CrawlEvent> {
        self.log.events().to_vec()
    }

    #[must_use]
    pub fn events(&self) -> &[CrawlEvent] {
        self.log.events()
    }
}
