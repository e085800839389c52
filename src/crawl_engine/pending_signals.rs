//! Signals that arrive while a link click is in flight
//!
//! During a click wait the orchestrator keeps draining the channel so the log
//! stays in arrival order. Document traffic is handled on the spot, a stale or
//! fresh quiescence tick waits for the event loop, and anything that ends the
//! run stops the candidate loop at once.

use std::collections::VecDeque;

use crate::crawl_events::{BrowserSignal, ShutdownReason};

/// Where a signal received mid-attempt goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidAttempt {
    /// Safe to handle now
    Absorb(BrowserSignal),
    /// Handle after the attempt, from the event loop
    Defer(BrowserSignal),
    /// Abandon the attempt and end the run
    Stop(ShutdownReason),
}

/// Sort one signal that arrived during a click wait
#[must_use]
pub fn route_mid_attempt(signal: BrowserSignal) -> MidAttempt {
    match signal {
        BrowserSignal::DeadlineReached => MidAttempt::Stop(ShutdownReason::DeadlineReached),
        BrowserSignal::ListenerClosed { .. } => MidAttempt::Stop(ShutdownReason::BrowserClosed),
        BrowserSignal::QuiescenceElapsed { .. } => MidAttempt::Defer(signal),
        other => MidAttempt::Absorb(other),
    }
}

/// FIFO of signals put aside for the event loop
#[derive(Debug, Default)]
pub struct PendingSignals {
    queue: VecDeque<BrowserSignal>,
}

impl PendingSignals {
    pub fn push(&mut self, signal: BrowserSignal) {
        self.queue.push_back(signal);
    }

    pub fn pop(&mut self) -> Option<BrowserSignal> {
        self.queue.pop_front()
    }

    /// The shutdown a queued signal demands, if any
    ///
    /// The deadline wins over a closed listener when both are queued.
    #[must_use]
    pub fn pending_stop(&self) -> Option<ShutdownReason> {
        if self.queue.contains(&BrowserSignal::DeadlineReached) {
            return Some(ShutdownReason::DeadlineReached);
        }
        self.queue
            .iter()
            .any(|signal| matches!(signal, BrowserSignal::ListenerClosed { .. }))
            .then_some(ShutdownReason::BrowserClosed)
    }
}
