//! Future wrapper around a crawl running on its own task.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use crate::crawl_engine::{CrawlError, CrawlResult};
use crate::crawl_events::CrawlEvent;

/// A pending crawl run. Resolves to the finished, ordered event log.
///
/// The crawl task delivers its result through a oneshot channel, so the log
/// is handed over exactly once. If the task dies without delivering, the
/// request resolves to `CrawlError::Cancelled`.
pub struct CrawlRequest {
    receiver: oneshot::Receiver<CrawlResult<Vec<CrawlEvent>>>,
}

impl CrawlRequest {
    /// Create a new `CrawlRequest` from a oneshot receiver
    #[must_use]
    pub fn new(receiver: oneshot::Receiver<CrawlResult<Vec<CrawlEvent>>>) -> Self {
        Self { receiver }
    }
}

impl Future for CrawlRequest {
    type Output = CrawlResult<Vec<CrawlEvent>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CrawlError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
