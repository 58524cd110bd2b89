//! Batch enrichment: resolve, extract, merge, checkpoint.
//!
//! Entities are processed one at a time. Each moves through
//! `Pending → Resolving → Extracting → Merged | PartiallyEnriched → Persisted`,
//! or ends in `Skipped` when neither the resolvers nor the biography yield
//! any data. A failing entity never stops the batch; only checkpoint
//! writes can.

use std::sync::Arc;

use chrono::Utc;
use roster_extract::{HtmlFieldExtractor, TextFieldExtractor};
use roster_fetch::RateGate;
use roster_resolver::{Resolution, SourceResolver, normalize};
use roster_shared::{BatchSnapshot, EntityRecord, EntityState, Namespace, Result, SeedEntity};
use roster_storage::CheckpointStore;
use tracing::{debug, info, instrument, warn};

use crate::payload;
use crate::progress::EnrichmentProgress;

/// Default checkpoint cadence in entities.
const DEFAULT_CHECKPOINT_EVERY: usize = 10;

/// Per-batch outcome counts. Resumed entities are not counted again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub enriched: usize,
    pub partial: usize,
    pub skipped: usize,
    pub resumed: usize,
}

impl BatchSummary {
    /// Entities processed in this run.
    pub fn processed(&self) -> usize {
        self.enriched + self.partial + self.skipped
    }
}

/// A finished batch: the completion snapshot and its counts.
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub snapshot: BatchSnapshot,
    pub summary: BatchSummary,
}

impl EnrichedBatch {
    pub fn records(&self) -> &[EntityRecord] {
        &self.snapshot.records
    }
}

/// Drives every configured resolver and extractor over a roster.
pub struct EnrichmentOrchestrator {
    resolvers: Vec<SourceResolver>,
    html: HtmlFieldExtractor,
    bio: TextFieldExtractor,
    checkpoints: Arc<dyn CheckpointStore>,
    gate: Arc<RateGate>,
    checkpoint_every: usize,
}

impl EnrichmentOrchestrator {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>, gate: Arc<RateGate>) -> Self {
        Self {
            resolvers: Vec::new(),
            html: HtmlFieldExtractor::new(),
            bio: TextFieldExtractor::new(),
            checkpoints,
            gate,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
        }
    }

    /// Add a resolver. Resolvers run in the order they were added.
    pub fn with_resolver(mut self, resolver: SourceResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn with_bio_extractor(mut self, bio: TextFieldExtractor) -> Self {
        self.bio = bio;
        self
    }

    /// Checkpoint after this many processed entities. Zero writes only the
    /// completion snapshot.
    pub fn checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    /// Namespaces a fully enriched record has.
    pub fn namespaces(&self) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = self.resolvers.iter().map(|r| r.namespace()).collect();
        namespaces.push(Namespace::StructuredBio);
        namespaces
    }

    /// Enrich `seeds` in order.
    ///
    /// With `resume`, records already `Persisted` or `Skipped` in that
    /// snapshot are carried over untouched and the batch continues under the
    /// same batch id. Only checkpoint write failures are returned as errors.
    #[instrument(skip_all, fields(entities = seeds.len(), resume = resume.is_some()))]
    pub async fn run(
        &self,
        seeds: Vec<SeedEntity>,
        resume: Option<BatchSnapshot>,
        progress: &dyn EnrichmentProgress,
    ) -> Result<EnrichedBatch> {
        let mut snapshot = resume.unwrap_or_default();
        snapshot.complete = false;
        let mut prior: Vec<EntityRecord> = std::mem::take(&mut snapshot.records);

        let total = seeds.len();
        let resumed = seeds
            .iter()
            .filter(|s| {
                prior
                    .iter()
                    .any(|r| r.identity == s.name && r.state.is_terminal())
            })
            .count();

        info!(batch_id = %snapshot.batch_id, total, resumed, "starting enrichment batch");
        progress.started(total, resumed);

        let mut summary = BatchSummary::default();
        let mut since_checkpoint = 0;

        for (index, seed) in seeds.into_iter().enumerate() {
            let existing = prior
                .iter()
                .position(|r| r.identity == seed.name)
                .map(|pos| prior.remove(pos));

            let mut record = match existing {
                Some(record) if record.state.is_terminal() => {
                    debug!(identity = %record.identity, state = ?record.state, "carried over from checkpoint");
                    summary.resumed += 1;
                    snapshot.records.push(record);
                    continue;
                }
                Some(record) => record,
                None => {
                    let names = normalize(&seed.name).to_vec();
                    EntityRecord::from_seed(seed, names)
                }
            };

            self.gate.wait().await;
            progress.entity_started(&record.identity, index + 1, total);
            self.enrich(&mut record).await;

            match record.state {
                EntityState::Merged => summary.enriched += 1,
                EntityState::PartiallyEnriched => summary.partial += 1,
                EntityState::Skipped => summary.skipped += 1,
                _ => {}
            }
            progress.entity_finished(&record);
            snapshot.records.push(record);

            since_checkpoint += 1;
            if self.checkpoint_every > 0 && since_checkpoint >= self.checkpoint_every {
                self.checkpoint(&mut snapshot)?;
                progress.checkpoint_written(snapshot.records.len());
                since_checkpoint = 0;
            }
        }

        if !prior.is_empty() {
            warn!(count = prior.len(), "checkpointed records missing from roster are kept");
            snapshot.records.append(&mut prior);
        }

        snapshot.complete = true;
        self.checkpoint(&mut snapshot)?;
        progress.checkpoint_written(snapshot.records.len());

        info!(
            enriched = summary.enriched,
            partial = summary.partial,
            skipped = summary.skipped,
            resumed = summary.resumed,
            "enrichment batch complete"
        );
        progress.finished(&summary);

        Ok(EnrichedBatch { snapshot, summary })
    }

    /// Resolve, extract and merge one record. Never fails; gaps leave
    /// namespaces empty. The biography rules run whatever the resolvers
    /// return, and only a record with no data at all is `Skipped`.
    #[instrument(skip_all, fields(identity = %record.identity))]
    async fn enrich(&self, record: &mut EntityRecord) {
        record.state = EntityState::Resolving;
        let variants = normalize(&record.identity);
        let hint = record.core_fields.country.clone();

        let mut resolved = Vec::new();
        for resolver in &self.resolvers {
            let ns = resolver.namespace();
            if record.enrichment.has(ns) {
                continue;
            }
            match resolver.resolve(&variants, hint.as_deref()).await {
                Resolution::Found(doc) => resolved.push((ns, doc)),
                Resolution::NotFound => debug!(namespace = %ns, "not found"),
            }
        }

        record.state = EntityState::Extracting;
        for (ns, doc) in resolved {
            if let Some(payload) = payload::from_resolved(ns, doc, &self.html) {
                record.merge(payload);
            }
        }

        if !record.enrichment.has(Namespace::StructuredBio) {
            match bio_text(record) {
                Some(text) => {
                    if !record.merge(payload::structured_bio(&text, &self.bio)) {
                        debug!("biography text yielded no structured fields");
                    }
                }
                None => debug!("no biography text"),
            }
        }

        if record.enrichment.is_empty() {
            info!("no source or biography yielded data, skipping");
            record.state = EntityState::Skipped;
            return;
        }

        let complete = self
            .namespaces()
            .iter()
            .all(|ns| record.enrichment.has(*ns));
        record.state = if complete {
            EntityState::Merged
        } else {
            EntityState::PartiallyEnriched
        };
        debug!(state = ?record.state, populated = ?record.enrichment.populated(), "merged");
    }

    /// Mark merged records persisted and write the snapshot.
    fn checkpoint(&self, snapshot: &mut BatchSnapshot) -> Result<()> {
        for record in snapshot
            .records
            .iter_mut()
            .filter(|r| r.state.awaits_persist())
        {
            record.state = EntityState::Persisted;
        }
        snapshot.updated_at = Utc::now();
        self.checkpoints.write(snapshot)
    }
}

/// Prose to run the biography rules over: the roster's own biography text,
/// else the encyclopedia summary.
fn bio_text(record: &EntityRecord) -> Option<String> {
    record
        .biography_text
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| {
            record
                .enrichment
                .encyclopedia
                .as_ref()
                .and_then(|e| e.summary.clone())
        })
}
