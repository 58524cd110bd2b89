//! File-backed collaborators of the enrichment pipeline.
//!
//! - [`JsonRosterSource`]: seed entities from a JSON array
//! - [`FileCheckpointStore`]: timestamped batch snapshots, never deleted
//! - [`write_roster`]: the final enriched roster

pub mod checkpoint;
pub mod roster;

pub use checkpoint::{CheckpointStore, FileCheckpointStore, write_roster};
pub use roster::{JsonRosterSource, RosterSource, parse_seeds};
