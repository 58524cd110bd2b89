//! Lookup providers: turn a query string into candidate references.
//!
//! Providers make exactly one request per query through a shared
//! [`DocumentStore`](roster_fetch::DocumentStore). Retrying is the caller's
//! business; a failed lookup simply means "no candidate" to the cascade.

mod opensearch;
mod websearch;

use async_trait::async_trait;
use roster_shared::{Candidate, TransportError};

pub use opensearch::OpenSearchProvider;
pub use websearch::{ResultLayout, WebSearchProvider};

/// A search backend queried by a [`SourceResolver`](crate::SourceResolver).
#[async_trait]
pub trait LookupProvider: Send + Sync {
    /// Provider name for tracing.
    fn name(&self) -> &str;

    /// Candidate references for `text`, best first. An empty list is a
    /// normal "no match".
    async fn query(&self, text: &str) -> Result<Vec<Candidate>, TransportError>;
}
