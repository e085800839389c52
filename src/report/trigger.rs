//! Trigger collaborator: tells a downstream processor a new log is stored.

use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::errors::ReportError;

/// Payload sent to the downstream processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerPayload {
    pub key: String,
    pub debug: bool,
}

/// HTTP trigger for the downstream processor
#[derive(Debug, Clone)]
pub struct Trigger {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl Trigger {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the payload and wait for the answer
    pub async fn send(&self, payload: &TriggerPayload) -> Result<(), ReportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReportError::TriggerStatus(response.status().as_u16()));
        }
        debug!(target: "redirect_recorder::report", "Triggered processing of {}", payload.key);
        Ok(())
    }

    /// Fire and forget: the request runs on its own task and failures are only logged
    pub fn fire(&self, key: String, debug: bool) -> JoinHandle<()> {
        let trigger = self.clone();
        tokio::spawn(async move {
            let payload = TriggerPayload { key, debug };
            if let Err(e) = trigger.send(&payload).await {
                warn!(target: "redirect_recorder::report", "Trigger for {} failed: {e}", payload.key);
            }
        })
    }
}
