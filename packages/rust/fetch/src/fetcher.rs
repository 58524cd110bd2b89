//! Bounded-retry document fetching.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};
use url::Url;

use roster_shared::{EnrichConfig, TransportError};

use crate::store::{Document, DocumentStore};

/// How many times to try a document, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single attempt, no delay.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl From<&EnrichConfig> for RetryPolicy {
    fn from(config: &EnrichConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay)
    }
}

/// Retrieves documents through a [`DocumentStore`], retrying failed attempts.
///
/// Any transport error or non-success status counts as a failed attempt.
/// The per-request timeout belongs to the store.
#[derive(Clone)]
pub struct PageFetcher {
    store: Arc<dyn DocumentStore>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(store: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// The underlying store, shared with lookup providers.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url` under the configured retry policy.
    pub async fn fetch(&self, url: &Url) -> Result<Document, TransportError> {
        self.fetch_with(url, self.policy.max_attempts, self.policy.delay)
            .await
    }

    /// Fetch `url` with an explicit attempt budget and inter-attempt delay.
    ///
    /// A budget of zero is treated as one attempt.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_with(
        &self,
        url: &Url,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<Document, TransportError> {
        let attempts = max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.store.get(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "fetched");
                    return Ok(Document {
                        url: url.clone(),
                        body,
                    });
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                    if attempt < attempts && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let last = last_error
            .map(|e| e.message)
            .unwrap_or_else(|| "no attempt made".into());
        Err(TransportError::new(
            url.as_str(),
            format!("gave up after {attempts} attempts: {last}"),
        ))
    }
}
