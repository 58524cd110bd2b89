//! Document retrieval: the HTTP store, retrying page fetcher, pacing gate,
//! and the optional raw-document archive.
//!
//! This crate provides:
//! - [`DocumentStore`]: the single-attempt fetch primitive ([`HttpDocumentStore`] over reqwest)
//! - [`PageFetcher`]: bounded retry on top of a store
//! - [`RateGate`]: token-bucket pacing shared across a run
//! - [`DebugArchive`]: raw document persistence for offline inspection

pub mod archive;
pub mod fetcher;
pub mod gate;
pub mod store;

pub use archive::{DebugArchive, FsDebugArchive};
pub use fetcher::{PageFetcher, RetryPolicy};
pub use gate::RateGate;
pub use store::{Document, DocumentStore, HttpDocumentStore};
