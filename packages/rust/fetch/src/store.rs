//! The fetch primitive: one GET, one answer, no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use roster_shared::{Result, RosterError, TransportError};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we consider valid (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// A retrieved document and the URL it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: Url,
    pub body: String,
}

/// Source of raw documents. Implementations make exactly one attempt.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the raw body behind `reference`.
    async fn get(&self, reference: &Url) -> std::result::Result<String, TransportError>;
}

/// [`DocumentStore`] backed by a reqwest client with a per-request timeout.
pub struct HttpDocumentStore {
    client: Client,
}

impl HttpDocumentStore {
    /// Build a store; `timeout` bounds every request end to end.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| RosterError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get(&self, reference: &Url) -> std::result::Result<String, TransportError> {
        debug!(%reference, "GET");

        let response = self
            .client
            .get(reference.as_str())
            .send()
            .await
            .map_err(|e| TransportError::new(reference.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                reference.as_str(),
                format!("HTTP {status}"),
            ));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(TransportError::new(
                    reference.as_str(),
                    format!("response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"),
                ));
            }
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::new(reference.as_str(), format!("body read failed: {e}")))
    }
}
