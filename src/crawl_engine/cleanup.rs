//! Graceful shutdown of the browser side of a run
//!
//! Shutdown is a fixed sequence of best-effort steps. Each step has its own
//! timeout, a failing step is logged and recorded, and the sequence always
//! runs to the end.

use anyhow::Result;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::CloseParams;
use log::{debug, info, warn};
use std::time::Duration;

use super::page_enhancer::page_key;
use super::page_timeout::with_page_timeout;
use crate::browser_setup::LaunchedBrowser;
use crate::crawl_events::PageKey;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// The shutdown sequence, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStep {
    CloseSecondaryTabs,
    GracePeriod,
    CloseMainPage,
    CloseBrowser,
    WaitForExit,
    RemoveProfile,
}

impl ShutdownStep {
    pub const SEQUENCE: [ShutdownStep; 6] = [
        Self::CloseSecondaryTabs,
        Self::GracePeriod,
        Self::CloseMainPage,
        Self::CloseBrowser,
        Self::WaitForExit,
        Self::RemoveProfile,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CloseSecondaryTabs => "close secondary tabs",
            Self::GracePeriod => "grace period",
            Self::CloseMainPage => "close main page",
            Self::CloseBrowser => "close browser",
            Self::WaitForExit => "wait for browser exit",
            Self::RemoveProfile => "remove profile directory",
        }
    }
}

/// Collects failures of best-effort steps
#[derive(Debug, Default)]
pub struct StepLog {
    errors: Vec<String>,
}

impl StepLog {
    pub fn record(&mut self, step: &str, outcome: Result<()>) {
        match outcome {
            Ok(()) => debug!(target: "redirect_recorder::cleanup", "{step}: done"),
            Err(e) => {
                warn!(target: "redirect_recorder::cleanup", "{step} failed: {e:#}");
                self.errors.push(format!("{step}: {e:#}"));
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> CleanupResult {
        if self.errors.is_empty() {
            CleanupResult::Success
        } else {
            CleanupResult::PartialFailure(self.errors)
        }
    }
}

async fn close_secondary_tabs(launched: &LaunchedBrowser, main: Option<&PageKey>) -> Result<()> {
    let pages = launched.browser.pages().await?;
    let mut failures = 0usize;
    for page in pages {
        if main.is_some_and(|key| *key == page_key(&page)) {
            continue;
        }
        if let Err(e) = page.close().await {
            debug!(target: "redirect_recorder::cleanup", "Secondary tab already gone: {e}");
            failures += 1;
        }
    }
    if failures > 0 {
        return Err(anyhow::anyhow!("{failures} tab(s) could not be closed"));
    }
    Ok(())
}

/// Close the main page, letting its before-unload handlers run
async fn close_main_page(page: &Page) -> Result<()> {
    page.execute(CloseParams::default()).await?;
    Ok(())
}

/// Run the whole shutdown sequence
///
/// Never fails: every problem ends up in the returned `CleanupResult`.
pub async fn graceful_shutdown(
    mut launched: LaunchedBrowser,
    main_page: Option<Page>,
    grace: Duration,
    step_timeout: Duration,
) -> CleanupResult {
    info!(target: "redirect_recorder::cleanup", "Attempting to shut down nicely");
    let main_key = main_page.as_ref().map(page_key);
    let mut log = StepLog::default();

    for step in ShutdownStep::SEQUENCE {
        let outcome = match step {
            ShutdownStep::CloseSecondaryTabs => {
                with_page_timeout(
                    close_secondary_tabs(&launched, main_key.as_ref()),
                    step_timeout,
                    step.name(),
                )
                .await
            }
            ShutdownStep::GracePeriod => {
                if main_page.is_some() {
                    tokio::time::sleep(grace).await;
                }
                Ok(())
            }
            ShutdownStep::CloseMainPage => match &main_page {
                Some(page) => with_page_timeout(close_main_page(page), step_timeout, step.name()).await,
                None => Ok(()),
            },
            ShutdownStep::CloseBrowser => {
                with_page_timeout(
                    async { launched.browser.close().await.map(|_| ()).map_err(Into::into) },
                    step_timeout,
                    step.name(),
                )
                .await
            }
            ShutdownStep::WaitForExit => {
                // Wait for the process to exit so it does not linger as a zombie
                with_page_timeout(
                    async { launched.browser.wait().await.map(|_| ()).map_err(Into::into) },
                    step_timeout,
                    step.name(),
                )
                .await
            }
            ShutdownStep::RemoveProfile => {
                if launched.owns_user_data_dir {
                    tokio::fs::remove_dir_all(&launched.user_data_dir)
                        .await
                        .map_err(Into::into)
                } else {
                    Ok(())
                }
            }
        };
        log.record(step.name(), outcome);
    }

    launched.handler.abort();
    log.finish()
}
