use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::config::CrawlConfig;

/// Install locations checked after the explicit path and `CHROMIUM_PATH`
const KNOWN_BROWSER_PATHS: &[&str] = &[
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/snap/bin/chromium",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

/// Binary names tried on `PATH` when nothing else matched
const BROWSER_COMMANDS: &[&str] = &["chromium", "chromium-browser", "google-chrome"];

/// Locate the browser binary for a run
///
/// Order: the configured path (which must exist), `CHROMIUM_PATH`, the known
/// install locations, then a `which` lookup.
pub fn find_browser_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow::anyhow!(
            "Configured browser executable does not exist: {}",
            path.display()
        ));
    }

    if let Some(path) = std::env::var_os("CHROMIUM_PATH").map(PathBuf::from) {
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!("CHROMIUM_PATH points to a missing file: {}", path.display());
    }

    if let Some(path) = KNOWN_BROWSER_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    {
        info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    BROWSER_COMMANDS
        .iter()
        .find_map(|cmd| which(cmd))
        .ok_or_else(|| {
            anyhow::anyhow!("No Chrome/Chromium found; set CHROMIUM_PATH or pass a browser path")
        })
}

fn which(cmd: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(cmd).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!found.is_empty()).then(|| PathBuf::from(found))
}

/// A running browser plus everything needed to tear it down
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub handler: JoinHandle<()>,
    pub user_data_dir: PathBuf,
    /// The profile directory was created for this run and should be removed afterwards
    pub owns_user_data_dir: bool,
}

/// Launch the browser for one crawl run
///
/// Failure here is fatal to the run and is propagated to the caller.
///
/// # Profile Isolation
/// When `chrome_data_dir` is configured it is used as-is and left in place.
/// Otherwise a fresh directory under the system temp dir is created and
/// removed again during shutdown.
pub async fn launch_browser(config: &CrawlConfig) -> Result<LaunchedBrowser> {
    let chrome_path = find_browser_executable(config.browser_executable_path())?;

    let (user_data_dir, owns_user_data_dir) = match config.chrome_data_dir() {
        Some(dir) => (dir.clone(), false),
        None => (
            std::env::temp_dir().join(format!(
                "redirect_recorder_chrome_{}_{}",
                std::process::id(),
                uuid::Uuid::new_v4().simple()
            )),
            true,
        ),
    };

    std::fs::create_dir_all(&user_data_dir).context("Failed to create user data directory")?;

    let viewport = config.viewport();
    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(viewport.width, viewport.height)
        // No emulated viewport on new tabs: popups must keep the size they asked for
        .viewport(None)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(chrome_path);

    if config.headless() {
        config_builder = config_builder.headless_mode(HeadlessMode::default());
    } else {
        config_builder = config_builder.with_head();
    }

    config_builder = config_builder
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-gpu")
        // Keep cross-origin iframes in the page's own session so their
        // requests reach the same interception listener
        .arg("--disable-features=IsolateOrigins,site-per-process,TranslateUI")
        .arg("--disable-popup-blocking")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--disable-background-timer-throttling")
        .arg("--disable-backgrounding-occluded-windows")
        .arg("--disable-breakpad")
        .arg("--disable-notifications")
        .arg("--disable-infobars")
        .arg("--metrics-recording-only")
        .arg("--password-store=basic")
        .arg("--use-mock-keychain")
        .arg("--mute-audio");

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser with config: {:?}", browser_config);
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(h) = handler.next().await {
            if let Err(e) = h {
                let error_msg = e.to_string();

                // Chrome sends CDP messages chromiumoxide does not model; those are harmless
                let is_benign_serialization_error = error_msg
                    .contains("data did not match any variant of untagged enum Message")
                    || error_msg.contains("Failed to deserialize WS response");

                if is_benign_serialization_error {
                    trace!("Suppressed benign CDP serialization error: {}", error_msg);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    Ok(LaunchedBrowser {
        browser,
        handler: handler_task,
        user_data_dir,
        owns_user_data_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_browser_is_an_error() {
        let missing = Path::new("/definitely/not/a/browser/binary");
        assert!(find_browser_executable(Some(missing)).is_err());
    }

    #[test]
    fn explicit_browser_path_wins() {
        let dir = std::env::temp_dir();
        assert_eq!(find_browser_executable(Some(&dir)).ok(), Some(dir));
    }

    #[test]
    fn unknown_command_is_not_found() {
        assert_eq!(which("redirect-recorder-no-such-browser"), None);
    }
}
