//! Per-page quiescence timers and the global crawl deadline
//!
//! Each timer is a spawned tokio task that sleeps and then runs its callback.
//! All timers share one closed flag. Closing aborts every task, and a task that
//! already woke checks the flag again before running, so nothing fires after
//! `close()` returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::crawl_events::PageKey;

#[derive(Debug, Default)]
pub struct CrawlTimers {
    closed: Arc<AtomicBool>,
    global: Option<JoinHandle<()>>,
    pages: HashMap<PageKey, JoinHandle<()>>,
}

impl CrawlTimers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_timer<F>(&self, delay: Duration, callback: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_closed() {
            return None;
        }
        let closed = Arc::clone(&self.closed);
        Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !closed.load(Ordering::SeqCst) {
                callback();
            }
        }))
    }

    /// Arm the global deadline, replacing any previous one.
    /// Must be called from within a tokio runtime.
    pub fn set_global_timeout<F>(&mut self, callback: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(previous) = self.global.take() {
            previous.abort();
        }
        self.global = self.spawn_timer(delay, callback);
    }

    /// Arm the quiescence timer for `page`, cancelling the one already running
    pub fn set_timeout_for_page<F>(&mut self, page: &str, callback: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel_timeout_for_page(page);
        if let Some(handle) = self.spawn_timer(delay, callback) {
            self.pages.insert(page.to_string(), handle);
        }
    }

    /// Returns true if a timer was armed for `page`
    pub fn cancel_timeout_for_page(&mut self, page: &str) -> bool {
        match self.pages.remove(page) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Suppress and abort every timer. Idempotent.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(global) = self.global.take() {
            global.abort();
        }
        for (_, handle) in self.pages.drain() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for CrawlTimers {
    fn drop(&mut self) {
        self.close();
    }
}
