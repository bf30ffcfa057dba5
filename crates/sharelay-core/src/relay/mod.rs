//! Outbound relay engine.
//!
//! Turns a [`ShareData`] into a single JSON `POST` against the configured
//! endpoint and records the attempt in the relay log. Every call produces
//! exactly one log entry that settles exactly once. There are no retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::history::{LogDraft, LogStore, RelayOutcome};
use crate::share::{RelayDocument, ShareData};

/// Outcome of one relay call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayResult {
    /// Whether the endpoint answered with a 2xx status
    pub success: bool,
    /// Response body on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Failure message otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResult {
    fn succeeded(response: String) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error),
        }
    }
}

impl From<&RelayResult> for RelayOutcome {
    fn from(result: &RelayResult) -> Self {
        if result.success {
            Self::Success(result.response.clone().unwrap_or_default())
        } else {
            Self::Error(result.error.clone().unwrap_or_default())
        }
    }
}

/// Relays shares over HTTP and logs each attempt.
#[derive(Clone)]
pub struct RelayEngine {
    client: Client,
    log: Arc<dyn LogStore>,
}

impl std::fmt::Debug for RelayEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEngine").finish_non_exhaustive()
    }
}

impl RelayEngine {
    /// Create an engine using the HTTP client's default timeouts.
    #[must_use]
    pub fn new(log: Arc<dyn LogStore>) -> Self {
        Self {
            client: Client::new(),
            log,
        }
    }

    /// Create an engine with an optional request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_timeout(log: Arc<dyn LogStore>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, log })
    }

    /// Relay `share` to `url`.
    ///
    /// The attempt is logged as pending before the request goes out and
    /// settled when it completes. Transport failures and non-2xx responses
    /// both come back as `success: false`.
    pub async fn relay(&self, share: &ShareData, url: &str) -> RelayResult {
        let document = RelayDocument::from(share);
        let entry = self.log.append(LogDraft::pending(share.summary()));

        tracing::debug!(id = %entry.id, files = document.files.len(), "Relaying share");

        let result = self.post(url, &document).await;

        match (&result.error, &result.response) {
            (Some(error), _) => tracing::warn!(id = %entry.id, "Relay failed: {}", error),
            (None, response) => tracing::info!(
                id = %entry.id,
                response_bytes = response.as_ref().map_or(0, String::len),
                "Relay succeeded"
            ),
        }

        self.log.update(&entry.id, RelayOutcome::from(&result));
        result
    }

    async fn post(&self, url: &str, document: &RelayDocument) -> RelayResult {
        let response = match self.client.post(url).json(document).send().await {
            Ok(response) => response,
            Err(e) => return RelayResult::failed(describe_transport_error(&e)),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return RelayResult::failed(describe_transport_error(&e)),
        };

        if status.is_success() {
            RelayResult::succeeded(body)
        } else {
            RelayResult::failed(format!("HTTP {}: {}", status.as_u16(), body))
        }
    }
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_builder() {
        format!("invalid relay URL: {err}")
    } else if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    }
}
