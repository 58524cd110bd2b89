//! Batch progress reporting.

use roster_shared::EntityRecord;

use crate::orchestrator::BatchSummary;

/// Callbacks fired by the orchestrator as a batch advances.
pub trait EnrichmentProgress: Send + Sync {
    /// Called once before the first entity.
    fn started(&self, total: usize, resumed: usize);
    /// Called when an entity begins processing. `position` is 1-based.
    fn entity_started(&self, identity: &str, position: usize, total: usize);
    /// Called with the record in its post-merge state.
    fn entity_finished(&self, record: &EntityRecord);
    /// Called after each successful checkpoint write.
    fn checkpoint_written(&self, records: usize);
    /// Called once after the completion snapshot is written.
    fn finished(&self, summary: &BatchSummary);
}

/// No-op reporter for headless and test usage.
pub struct SilentEnrichmentProgress;

impl EnrichmentProgress for SilentEnrichmentProgress {
    fn started(&self, _total: usize, _resumed: usize) {}
    fn entity_started(&self, _identity: &str, _position: usize, _total: usize) {}
    fn entity_finished(&self, _record: &EntityRecord) {}
    fn checkpoint_written(&self, _records: usize) {}
    fn finished(&self, _summary: &BatchSummary) {}
}
