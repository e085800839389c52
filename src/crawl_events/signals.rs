//! Single-consumer signal channel between the browser adapter and the orchestrator
//!
//! Listener tasks attached to the browser publish typed `BrowserSignal`s; the
//! orchestrator is the only receiver and the only code that mutates the crawl
//! state. The channel preserves publish order, which is what gives the crawl
//! log its arrival ordering within a frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use super::errors::SignalError;
use crate::runtime::create_channel;

/// Chrome's own identifier for a frame (`Page.FrameId`)
pub type CdpFrameId = String;

/// Identity of a browser tab (`Target.TargetId`)
pub type PageKey = String;

/// Everything the orchestrator reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserSignal {
    /// A document-type request passed the router and should be logged
    DocumentRequest {
        page: PageKey,
        frame: CdpFrameId,
        url: String,
        /// The browser reported this request as following a redirect response
        server_redirect: bool,
    },
    /// The page's top frame fired `DOMContentLoaded`
    DocumentLoaded { page: PageKey },
    /// A frame went away; its registry entry can be dropped
    FrameDetached { frame: CdpFrameId },
    /// A new tab (page target) appeared
    TabOpened { target: PageKey },
    /// The page went a full settle window without a load event.
    /// `generation` identifies which arming of the timer fired.
    QuiescenceElapsed { page: PageKey, generation: u64 },
    /// The global crawl deadline fired
    DeadlineReached,
    /// A listener stream ended, which means the CDP connection is gone
    ListenerClosed { listener: &'static str },
}

/// Publishing half, cloned into every listener task and timer callback
#[derive(Debug, Clone)]
pub struct SignalSender {
    sender: UnboundedSender<BrowserSignal>,
    shutdown_flag: Arc<AtomicBool>,
}

impl SignalSender {
    /// Publish a signal to the orchestrator
    ///
    /// # Errors
    /// `SignalError::Shutdown` once the channel has been shut down (the signal is
    /// discarded), `SignalError::ReceiverGone` if the orchestrator was dropped.
    pub fn publish(&self, signal: BrowserSignal) -> Result<(), SignalError> {
        if self.is_shutdown() {
            return Err(SignalError::Shutdown);
        }
        self.sender
            .send(signal)
            .map_err(|_| SignalError::ReceiverGone)
    }

    /// Check if shutdown has been signaled on this channel
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}

/// Consuming half, owned by the orchestrator
#[derive(Debug)]
pub struct SignalReceiver {
    receiver: UnboundedReceiver<BrowserSignal>,
    shutdown_flag: Arc<AtomicBool>,
}

impl SignalReceiver {
    /// Wait for the next signal; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<BrowserSignal> {
        self.receiver.recv().await
    }

    /// Take a signal that is already queued without waiting
    pub fn try_recv(&mut self) -> Option<BrowserSignal> {
        self.receiver.try_recv().ok()
    }

    /// Stop accepting new signals. Idempotent.
    ///
    /// Senders start failing immediately. Signals still queued are never
    /// handled; the run is over by then.
    pub fn shutdown(&mut self) {
        if !self.shutdown_flag.swap(true, Ordering::SeqCst) {
            log::debug!(target: "redirect_recorder::signals", "Signal channel shutdown");
        }
        self.receiver.close();
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }
}

/// Create a connected sender/receiver pair
#[must_use]
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (sender, receiver) = create_channel();
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    (
        SignalSender {
            sender,
            shutdown_flag: Arc::clone(&shutdown_flag),
        },
        SignalReceiver {
            receiver,
            shutdown_flag,
        },
    )
}
