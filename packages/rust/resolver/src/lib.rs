//! Finding source documents for a roster name.
//!
//! This crate provides:
//! - [`names`]: search variants from a raw, decorated name
//! - [`providers`]: [`LookupProvider`] and the encyclopedia/web backends
//! - [`SourceResolver`]: the first-success-wins cascade over variants

pub mod cascade;
pub mod names;
pub mod providers;

pub use cascade::{Resolution, ResolvedDocument, SourceResolver};
pub use names::{NameVariants, normalize};
pub use providers::{LookupProvider, OpenSearchProvider, ResultLayout, WebSearchProvider};
