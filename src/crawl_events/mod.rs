//! Crawl log records and the browser signal channel
//!
//! `types` holds the schema of the finished log; `signals` is the ordered
//! channel the browser adapter uses to hand observations to the orchestrator.

pub mod errors;
pub mod signals;
pub mod types;

pub use errors::SignalError;
pub use signals::{BrowserSignal, CdpFrameId, PageKey, SignalReceiver, SignalSender, signal_channel};
pub use types::{CrawlEvent, FrameKey, NavigationRecord, RequestRecord, ShutdownReason};
