//! Async plumbing shared by the crawl engine

pub mod async_wrappers;

pub use async_wrappers::CrawlRequest;

/// Create the unbounded channel used for browser signals
#[inline(always)]
#[must_use]
pub fn create_channel<T>() -> (
    tokio::sync::mpsc::UnboundedSender<T>,
    tokio::sync::mpsc::UnboundedReceiver<T>,
) {
    tokio::sync::mpsc::unbounded_channel()
}
