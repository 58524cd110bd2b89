//! Enrichment pipeline for the cardinal roster.
//!
//! This crate ties resolvers, extractors and checkpoint storage together:
//! - [`EnrichmentOrchestrator`]: the per-entity state machine and batch loop
//! - [`payload`]: resolved documents → namespace payloads
//! - [`EnrichmentProgress`]: progress callbacks for the CLI
//! - [`setup`]: building all of the above from [`AppConfig`](roster_shared::AppConfig)

pub mod orchestrator;
pub mod payload;
pub mod progress;
pub mod setup;

pub use orchestrator::{BatchSummary, EnrichedBatch, EnrichmentOrchestrator};
pub use progress::{EnrichmentProgress, SilentEnrichmentProgress};
pub use setup::{build_orchestrator, build_resolvers, build_resolvers_with};
