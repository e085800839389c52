//! Upload collaborator
//!
//! A finished event log is stored as one JSON object named after the seed's
//! registrable domain plus a random id. The store itself sits behind a small
//! trait; the crate ships a filesystem implementation where each bucket is a
//! directory under a root.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::timeout;

use super::errors::ReportError;
use crate::crawl_events::CrawlEvent;
use crate::utils::domain_of;

/// Timeout for serializing a log on the blocking pool
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Somewhere an event log can be put
pub trait ObjectStore {
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<(), ReportError>> + Send;
}

/// `<registrable-domain>_<uuid>.json`
pub fn object_key(url: &str) -> Result<String, ReportError> {
    let domain = domain_of(url).ok_or_else(|| ReportError::NoDomain(url.to_string()))?;
    Ok(format!("{domain}_{}.json", uuid::Uuid::new_v4()))
}

/// Serialize `events`, store them under a fresh key and return that key
pub async fn record<S: ObjectStore>(
    store: &S,
    url: &str,
    bucket: &str,
    events: Vec<CrawlEvent>,
) -> Result<String, ReportError> {
    let key = object_key(url)?;

    // Serialization off the async workers; logs from long runs get big
    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_vec(&events));
    let body = match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => {
            return Err(ReportError::Store {
                key,
                source: std::io::Error::other(format!("serialization task panicked: {e}")),
            });
        }
        Err(_) => {
            log::warn!(
                "JSON serialization timeout (timeout: {:?})",
                BLOCKING_SERIALIZATION_TIMEOUT
            );
            return Err(ReportError::Store {
                key,
                source: std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "serialization timed out",
                ),
            });
        }
    };

    store.put(bucket, &key, body).await?;
    log::info!(target: "redirect_recorder::report", "Stored {key} in {bucket}");
    Ok(key)
}

/// Filesystem store: `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `key` lives inside `bucket`
    pub fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, ReportError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(ReportError::InvalidBucket(bucket.to_string()));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FsObjectStore {
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ReportError> {
        let path = self.path_for(bucket, key)?;
        let io_err = |source| ReportError::Store {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, body).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_registrable_domain() {
        let key = object_key("https://news.example.co.uk/a?b=c").expect("key");
        assert!(key.starts_with("example.co.uk_"));
        assert!(key.ends_with(".json"));
    }

    #[test]
    fn bucket_cannot_escape_the_root() {
        let store = FsObjectStore::new("/tmp/store");
        assert!(store.path_for("../etc", "k.json").is_err());
        assert!(store.path_for("", "k.json").is_err());
        assert!(store.path_for("bucket", "k.json").is_ok());
    }
}
