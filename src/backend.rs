//! # Backend Client
//!
//! Talks to the remote POS backend that queues print jobs.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | GET | `{base}/print-jobs/pending` | (none) |
//! | PUT | `{base}/print-jobs/{id}/status` | `{status, error_message}` |
//!
//! There is no retry here. A failed fetch is retried by the next poll tick;
//! an unacknowledged job is re-surfaced by the backend itself.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::job::{PendingBatch, StatusUpdate};

/// Source of pending jobs and sink for their outcomes.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Fetch the current batch of pending jobs.
    async fn fetch_pending(&self) -> Result<PendingBatch>;

    /// Report the terminal status of one job.
    async fn report_status(&self, job_id: &str, update: &StatusUpdate) -> Result<()>;
}

/// [`JobBackend`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    /// Create a client for `base_url`; `timeout` bounds each request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| BridgeError::Config(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BridgeError::Config(format!(
                "Backend URL '{}' cannot carry a path",
                base_url
            )));
        }

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("posbridge/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BridgeError::Config(format!("HTTP client error: {}", e)))?;

        Ok(Self { client, base })
    }

    /// `base` with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn pending_url(&self) -> Url {
        self.endpoint(&["print-jobs", "pending"])
    }

    pub fn status_url(&self, job_id: &str) -> Url {
        self.endpoint(&["print-jobs", job_id, "status"])
    }
}

#[async_trait]
impl JobBackend for HttpBackend {
    async fn fetch_pending(&self) -> Result<PendingBatch> {
        let url = self.pending_url();
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| BridgeError::Fetch(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Fetch(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Fetch(format!("reading response from {}: {}", url, e)))?;
        let value = if body.iter().all(u8::is_ascii_whitespace) {
            Value::Null
        } else {
            serde_json::from_slice(&body)
                .map_err(|e| BridgeError::Fetch(format!("invalid JSON from {}: {}", url, e)))?
        };

        let batch = PendingBatch::from_value(value).map_err(BridgeError::Fetch)?;
        debug!(jobs = batch.jobs.len(), alert = batch.alert_sound, "fetched pending jobs");
        Ok(batch)
    }

    async fn report_status(&self, job_id: &str, update: &StatusUpdate) -> Result<()> {
        let url = self.status_url(job_id);
        let response = self
            .client
            .put(url.clone())
            .json(update)
            .send()
            .await
            .map_err(|e| BridgeError::StatusReport(format!("PUT {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::StatusReport(format!(
                "PUT {} returned {}",
                url, status
            )));
        }
        Ok(())
    }
}
