//! Core domain types for roster records and batch snapshots.
//!
//! Everything here serializes with camelCase keys. Field names are part of the
//! output contract: two batches produced by different runs must be diffable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Namespace / Source
// ---------------------------------------------------------------------------

/// Fixed partition of the enrichment payload by originating source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Namespace {
    Encyclopedia,
    News,
    GeneralSearch,
    StructuredBio,
}

impl Namespace {
    /// All namespaces, in output order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Encyclopedia,
        Namespace::News,
        Namespace::GeneralSearch,
        Namespace::StructuredBio,
    ];

    /// Key used in serialized output and provenance paths.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Encyclopedia => "encyclopedia",
            Self::News => "news",
            Self::GeneralSearch => "generalSearch",
            Self::StructuredBio => "structuredBio",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a field value came from, recorded per field path for auditability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    /// The primary structured roster listing.
    Roster,
    Encyclopedia,
    News,
    GeneralSearch,
    StructuredBio,
}

impl From<Namespace> for Source {
    fn from(ns: Namespace) -> Self {
        match ns {
            Namespace::Encyclopedia => Self::Encyclopedia,
            Namespace::News => Self::News,
            Namespace::GeneralSearch => Self::GeneralSearch,
            Namespace::StructuredBio => Self::StructuredBio,
        }
    }
}

// ---------------------------------------------------------------------------
// Seeds and core fields
// ---------------------------------------------------------------------------

/// Fields owned by the primary source. Write-once; enrichment never touches them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// The pope who created the cardinal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointing_authority: Option<String>,
}

/// One entity as yielded by a roster source, before enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEntity {
    pub name: String,
    #[serde(default)]
    pub core_fields: CoreFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Enrichment sub-records
// ---------------------------------------------------------------------------

/// One candidate reference returned by a lookup provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Publisher name (news results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication date as rendered by the provider (news results).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

impl Candidate {
    /// A candidate with only a URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// `encyclopedia` namespace: an encyclopedia article and its fact table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncyclopediaEntry {
    /// Query that produced the match.
    pub query: String,
    /// Article URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Infobox header → value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub facts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EncyclopediaEntry {
    fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["query", "url"];
        if self.summary.is_some() {
            fields.push("summary");
        }
        if !self.facts.is_empty() {
            fields.push("facts");
        }
        if self.image_url.is_some() {
            fields.push("imageUrl");
        }
        fields
    }
}

/// `news` and `generalSearch` namespaces: a result list plus the top hit's summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDigest {
    pub query: String,
    /// URL of the document that was fetched (the top hit).
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hits: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl SearchDigest {
    fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = vec!["query", "url"];
        if !self.hits.is_empty() {
            fields.push("hits");
        }
        if self.summary.is_some() {
            fields.push("summary");
        }
        fields
    }
}

/// `structuredBio` namespace: facts pattern-matched out of the biography prose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredBio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordination_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episcopal_consecration_date: Option<String>,
    /// Date the entity was created cardinal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
}

impl StructuredBio {
    /// True when no rule produced anything.
    pub fn is_empty(&self) -> bool {
        self.populated_fields().is_empty()
    }

    fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.birth_place.is_some() {
            fields.push("birthPlace");
        }
        if self.ordination_date.is_some() {
            fields.push("ordinationDate");
        }
        if self.episcopal_consecration_date.is_some() {
            fields.push("episcopalConsecrationDate");
        }
        if self.elevation_date.is_some() {
            fields.push("elevationDate");
        }
        if !self.education.is_empty() {
            fields.push("education");
        }
        if !self.languages.is_empty() {
            fields.push("languages");
        }
        fields
    }
}

/// Output of exactly one resolver or extractor, tagged by its namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentPayload {
    Encyclopedia(EncyclopediaEntry),
    News(SearchDigest),
    GeneralSearch(SearchDigest),
    StructuredBio(StructuredBio),
}

impl EnrichmentPayload {
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Encyclopedia(_) => Namespace::Encyclopedia,
            Self::News(_) => Namespace::News,
            Self::GeneralSearch(_) => Namespace::GeneralSearch,
            Self::StructuredBio(_) => Namespace::StructuredBio,
        }
    }

    /// Dotted provenance paths for every populated field, e.g. `enrichment.news.hits`.
    pub fn field_paths(&self) -> Vec<String> {
        let fields = match self {
            Self::Encyclopedia(e) => e.populated_fields(),
            Self::News(d) | Self::GeneralSearch(d) => d.populated_fields(),
            Self::StructuredBio(b) => b.populated_fields(),
        };
        let ns = self.namespace().key();
        fields
            .into_iter()
            .map(|f| format!("enrichment.{ns}.{f}"))
            .collect()
    }

    /// A payload carrying no fields must never be merged.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::StructuredBio(b) => b.is_empty(),
            // Resolver payloads always carry at least query + url.
            _ => false,
        }
    }
}

/// Typed enrichment payloads keyed by fixed namespace names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encyclopedia: Option<EncyclopediaEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<SearchDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_search: Option<SearchDigest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_bio: Option<StructuredBio>,
}

impl Enrichment {
    /// Whether the given namespace already holds data.
    pub fn has(&self, ns: Namespace) -> bool {
        match ns {
            Namespace::Encyclopedia => self.encyclopedia.is_some(),
            Namespace::News => self.news.is_some(),
            Namespace::GeneralSearch => self.general_search.is_some(),
            Namespace::StructuredBio => self.structured_bio.is_some(),
        }
    }

    /// Namespaces currently populated, in output order.
    pub fn populated(&self) -> Vec<Namespace> {
        Namespace::ALL.into_iter().filter(|ns| self.has(*ns)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.populated().is_empty()
    }

    /// Whether the stored value for the payload's namespace equals the payload.
    pub fn holds(&self, payload: &EnrichmentPayload) -> bool {
        match payload {
            EnrichmentPayload::Encyclopedia(e) => self.encyclopedia.as_ref() == Some(e),
            EnrichmentPayload::News(d) => self.news.as_ref() == Some(d),
            EnrichmentPayload::GeneralSearch(d) => self.general_search.as_ref() == Some(d),
            EnrichmentPayload::StructuredBio(b) => self.structured_bio.as_ref() == Some(b),
        }
    }

    /// Store a payload into its namespace slot. Callers enforce the
    /// write-once policy; this only routes by tag.
    pub(crate) fn store(&mut self, payload: EnrichmentPayload) {
        match payload {
            EnrichmentPayload::Encyclopedia(e) => self.encyclopedia = Some(e),
            EnrichmentPayload::News(d) => self.news = Some(d),
            EnrichmentPayload::GeneralSearch(d) => self.general_search = Some(d),
            EnrichmentPayload::StructuredBio(b) => self.structured_bio = Some(b),
        }
    }
}

// ---------------------------------------------------------------------------
// EntityRecord
// ---------------------------------------------------------------------------

/// Per-entity lifecycle. `Persisted` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityState {
    #[default]
    Pending,
    Resolving,
    Extracting,
    Merged,
    /// Merged, but some resolvers/extractors produced nothing.
    PartiallyEnriched,
    Persisted,
    /// Every resolver returned nothing; no extraction was attempted.
    Skipped,
}

impl EntityState {
    /// Whether a resumed run should leave this record alone.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Skipped)
    }

    /// Whether the record is merged but not yet covered by a checkpoint.
    pub fn awaits_persist(&self) -> bool {
        matches!(self, Self::Merged | Self::PartiallyEnriched)
    }
}

/// The merged, field-provenanced record for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Raw name as listed by the primary source. Never modified.
    pub identity: String,
    /// Search variants, most specific first.
    pub normalized_names: Vec<String>,
    pub core_fields: CoreFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biography_text: Option<String>,
    #[serde(default)]
    pub enrichment: Enrichment,
    #[serde(default)]
    pub field_provenance: BTreeMap<String, Source>,
    #[serde(default)]
    pub state: EntityState,
}

impl EntityRecord {
    /// Build a pending record from a seed, stamping roster provenance on
    /// every field the primary source supplied.
    pub fn from_seed(seed: SeedEntity, normalized_names: Vec<String>) -> Self {
        let mut field_provenance = BTreeMap::new();
        let core = &seed.core_fields;
        for (path, present) in [
            ("coreFields.birthDate", core.birth_date.is_some()),
            ("coreFields.country", core.country.is_some()),
            ("coreFields.appointingAuthority", core.appointing_authority.is_some()),
            ("biographyUrl", seed.biography_url.is_some()),
            ("biographyText", seed.biography_text.is_some()),
        ] {
            if present {
                field_provenance.insert(path.to_string(), Source::Roster);
            }
        }

        Self {
            identity: seed.name,
            normalized_names,
            core_fields: seed.core_fields,
            biography_url: seed.biography_url,
            biography_text: seed.biography_text,
            enrichment: Enrichment::default(),
            field_provenance,
            state: EntityState::Pending,
        }
    }

    /// Write a payload into its namespace if the namespace is absent.
    ///
    /// Returns `true` if the record changed. An occupied namespace is never
    /// overwritten; an identical re-derivation is accepted as a no-op.
    pub fn merge(&mut self, payload: EnrichmentPayload) -> bool {
        if payload.is_empty() {
            return false;
        }
        let ns = payload.namespace();
        if self.enrichment.has(ns) {
            return false;
        }
        for path in payload.field_paths() {
            self.field_provenance.insert(path, Source::from(ns));
        }
        self.enrichment.store(payload);
        true
    }
}

// ---------------------------------------------------------------------------
// BatchSnapshot
// ---------------------------------------------------------------------------

/// Checkpoint payload: every record processed so far in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSnapshot {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on the completion snapshot only.
    #[serde(default)]
    pub complete: bool,
    pub records: Vec<EntityRecord>,
}

impl BatchSnapshot {
    /// An empty snapshot for a fresh batch.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            batch_id: Uuid::now_v7(),
            started_at: now,
            updated_at: now,
            complete: false,
            records: Vec::new(),
        }
    }

    /// Find a record by its raw identity.
    pub fn record(&self, identity: &str) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.identity == identity)
    }

    /// Number of records in a terminal state.
    pub fn terminal_count(&self) -> usize {
        self.records.iter().filter(|r| r.state.is_terminal()).count()
    }
}

impl Default for BatchSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
