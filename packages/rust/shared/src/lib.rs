//! Shared types, error model, and configuration for the cardinal roster tools.
//!
//! This crate is the foundation depended on by all other roster crates.
//! It provides:
//! - [`RosterError`] and [`TransportError`], the error taxonomy
//! - Domain types ([`EntityRecord`], [`Enrichment`], [`BatchSnapshot`], ...)
//! - Configuration ([`AppConfig`], [`EnrichConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ArchiveConfig, DefaultsConfig, EnrichConfig, FetchConfig, ProviderConfig,
    ProvidersConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, RosterError, TransportError};
pub use types::{
    BatchSnapshot, Candidate, CoreFields, EncyclopediaEntry, Enrichment, EnrichmentPayload,
    EntityRecord, EntityState, Namespace, SearchDigest, SeedEntity, Source, StructuredBio,
};
