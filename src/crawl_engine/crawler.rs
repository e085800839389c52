use tokio::sync::oneshot;

use super::crawl_types::{CrawlError, CrawlResult, Crawler};
use super::orchestrator::run_crawl;
use crate::config::{CrawlArgs, CrawlConfig};
use crate::crawl_events::CrawlEvent;
use crate::runtime::CrawlRequest;

/// Headless-browser crawler that records one redirect chain per run
#[derive(Debug, Clone)]
pub struct RedirectCrawler {
    config: CrawlConfig,
}

impl RedirectCrawler {
    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }
}

impl Crawler for RedirectCrawler {
    fn new(config: CrawlConfig) -> Self {
        Self { config }
    }

    fn crawl(&self) -> CrawlRequest {
        // Create a channel for the result
        let (tx, rx) = oneshot::channel();

        let config = self.config.clone();

        // Spawn a task to do the async work
        tokio::spawn(async move {
            let result = run_crawl(config).await;
            if let Err(CrawlError::BrowserError(msg)) = &result {
                log::error!(target: "redirect_recorder::crawler", "Crawl aborted: {msg}");
            }

            // Receiver may have been dropped; nothing else to do then
            let _ = tx.send(result);
        });

        // Return concrete type wrapping the channel
        CrawlRequest::new(rx)
    }
}

/// Validate `args`, run one crawl and hand the finished log to `on_complete`
///
/// Input errors are reported before any browser is started. `on_complete`
/// runs exactly once, and only when a log exists.
pub async fn crawl<F>(args: CrawlArgs, on_complete: F) -> CrawlResult<()>
where
    F: FnOnce(Vec<CrawlEvent>),
{
    args.validate()?;
    let config = args
        .into_config()
        .map_err(|e| CrawlError::ConfigError(format!("{e:#}")))?;

    let events = RedirectCrawler::new(config).crawl().await?;
    on_complete(events);
    Ok(())
}
