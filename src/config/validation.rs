//! Entry payload and its validation rules
//!
//! `CrawlArgs` is what a caller hands over (CLI flags, a JSON job payload).
//! It is checked before any browser activity starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::CrawlConfig;
use crate::utils::MAX_CRAWL_SECONDS;

/// Rejections of the entry payload
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("a url to crawl is required")]
    MissingUrl,

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("seconds must be an integer in (0, 300], got {0}")]
    SecondsOutOfRange(i64),
}

/// The crawl request as supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlArgs {
    #[serde(default)]
    pub url: Option<String>,
    /// Global deadline in seconds. Non-integer values fail to deserialize.
    #[serde(default)]
    pub seconds: Option<i64>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub browser_executable_path: Option<PathBuf>,
    #[serde(default)]
    pub bucket: Option<String>,
    /// Endpoint notified with the stored key once the log is uploaded
    #[serde(default)]
    pub trigger_endpoint: Option<String>,
    #[serde(default)]
    pub follow_local_links: bool,
    #[serde(default)]
    pub block_images: bool,
}

impl CrawlArgs {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Check the payload without building anything
    ///
    /// # Errors
    /// `MissingUrl` when the url is absent or blank, `SecondsOutOfRange` when
    /// `seconds` is present but not in `(0, 300]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {}
            _ => return Err(ValidationError::MissingUrl),
        }

        if let Some(seconds) = self.seconds {
            let in_range = u64::try_from(seconds)
                .is_ok_and(|secs| secs > 0 && secs <= MAX_CRAWL_SECONDS);
            if !in_range {
                return Err(ValidationError::SecondsOutOfRange(seconds));
            }
        }

        Ok(())
    }

    /// Validate and turn the payload into a run configuration
    ///
    /// # Errors
    /// Any `ValidationError`, wrapped in `anyhow` so callers can downcast.
    pub fn into_config(self) -> anyhow::Result<CrawlConfig> {
        self.validate()?;

        let url = self.url.unwrap_or_default();
        let mut builder = CrawlConfig::builder()
            .start_url(url)
            .debug(self.debug)
            .browser_executable_path(self.browser_executable_path)
            .trigger_endpoint(self.trigger_endpoint)
            .follow_local_links(self.follow_local_links)
            .block_images(self.block_images);
        if let Some(seconds) = self.seconds.and_then(|s| u64::try_from(s).ok()) {
            builder = builder.seconds(seconds);
        }
        if let Some(bucket) = self.bucket {
            builder = builder.bucket(bucket);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_payload_deserializes() {
        let args: CrawlArgs = serde_json::from_str(
            r#"{"url":"https://example.com","seconds":30,"debug":true,"browserExecutablePath":"/usr/bin/chromium"}"#,
        )
        .expect("payload should parse");
        assert_eq!(args.seconds, Some(30));
        assert!(args.debug);
        assert_eq!(
            args.browser_executable_path,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn fractional_seconds_are_rejected_at_parse_time() {
        let parsed = serde_json::from_str::<CrawlArgs>(r#"{"url":"https://a.com","seconds":1.5}"#);
        assert!(parsed.is_err());
    }
}
