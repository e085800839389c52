//! redirect-recorder entry point
//!
//! Crawls one seed URL, prints the finished log as JSON, stores it in a
//! bucket directory and optionally pokes a downstream processor.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use redirect_recorder::config::CrawlArgs;
use redirect_recorder::report::{self, FsObjectStore, Trigger};
use redirect_recorder::utils::DEFAULT_BUCKET;
use redirect_recorder::crawl;

/// Follow a page's navigation chain in a headless browser and record every hop
#[derive(Parser, Debug)]
#[command(name = "redirect-recorder")]
#[command(version)]
#[command(about = "Record the redirect chain behind a URL", long_about = None)]
struct Cli {
    /// Seed URL; a missing scheme means https
    #[arg(value_name = "URL")]
    url: String,

    /// Global crawl deadline in seconds (1-300)
    #[arg(short, long)]
    seconds: Option<i64>,

    /// Show the browser window and log at debug level
    #[arg(short, long)]
    debug: bool,

    /// Chrome/Chromium binary to use instead of searching for one
    #[arg(long, env = "CHROMIUM_PATH")]
    browser_executable_path: Option<PathBuf>,

    /// Bucket the log is stored in
    #[arg(long, default_value = DEFAULT_BUCKET)]
    bucket: String,

    /// Directory holding bucket directories
    #[arg(long, default_value = "buckets")]
    store_dir: PathBuf,

    /// Skip storing the log
    #[arg(long)]
    no_upload: bool,

    /// HTTP endpoint notified with the stored key
    #[arg(long)]
    trigger_endpoint: Option<String>,

    /// Treat any URL change as a navigation and skip href filtering (local fixtures)
    #[arg(long)]
    follow_local_links: bool,

    /// Also abort image requests
    #[arg(long)]
    block_images: bool,
}

fn setup_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

impl Cli {
    fn crawl_args(&self) -> CrawlArgs {
        CrawlArgs {
            url: Some(self.url.clone()),
            seconds: self.seconds,
            debug: self.debug,
            browser_executable_path: self.browser_executable_path.clone(),
            bucket: Some(self.bucket.clone()),
            trigger_endpoint: self.trigger_endpoint.clone(),
            follow_local_links: self.follow_local_links,
            block_images: self.block_images,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    let args = cli.crawl_args();
    let config = args.clone().into_config().context("Invalid crawl arguments")?;
    info!("Crawling {} for up to {}s", config.start_url(), config.seconds());

    let mut finished = None;
    crawl(args, |events| finished = Some(events)).await?;
    let events = finished.unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&events)?);

    if cli.no_upload {
        return Ok(());
    }

    let store = FsObjectStore::new(&cli.store_dir);
    let key = report::record(&store, config.start_url(), config.bucket(), events).await?;
    info!("Stored log as {}/{key}", config.bucket());

    if let Some(endpoint) = config.trigger_endpoint() {
        // The process is about to exit; give the detached request a chance to go out
        let pending = Trigger::new(endpoint).fire(key, config.debug());
        if let Err(e) = pending.await {
            error!("Trigger task failed: {e}");
        }
    }

    Ok(())
}
