use thiserror::Error;

/// Failures of the upload and trigger collaborators
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("URL has no registrable domain: {0}")]
    NoDomain(String),

    #[error("Failed to serialize event log: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Object store I/O failed for {key}: {source}")]
    Store {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bucket name: {0:?}")]
    InvalidBucket(String),

    #[error("Trigger request failed: {0}")]
    Trigger(#[from] reqwest::Error),

    #[error("Trigger endpoint answered with status {0}")]
    TriggerStatus(u16),
}
