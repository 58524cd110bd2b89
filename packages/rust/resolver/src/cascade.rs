//! Cascading resolution of one name against one lookup provider.

use std::sync::Arc;

use roster_fetch::{DebugArchive, Document, PageFetcher};
use roster_shared::{Candidate, Namespace};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::names::NameVariants;
use crate::providers::LookupProvider;

/// A matched query, the candidates it returned, and the top candidate's document.
#[derive(Debug, Clone)]
pub struct ResolvedDocument {
    pub query: String,
    pub candidates: Vec<Candidate>,
    pub document: Document,
}

/// Outcome of a cascade. `NotFound` is a normal result, not an error.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(ResolvedDocument),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<ResolvedDocument> {
        match self {
            Self::Found(doc) => Some(doc),
            Self::NotFound => None,
        }
    }
}

/// Tries name variants against a provider until one yields a candidate.
///
/// Queries run in order: full name, simple name with hint, distinctive name
/// with hint. The first query with any candidate ends the cascade and its
/// top candidate is fetched through the [`PageFetcher`].
pub struct SourceResolver {
    namespace: Namespace,
    provider: Arc<dyn LookupProvider>,
    fetcher: PageFetcher,
    keyword: String,
    suffix: Option<String>,
    archive: Option<Arc<dyn DebugArchive>>,
}

impl SourceResolver {
    pub fn new(
        namespace: Namespace,
        provider: Arc<dyn LookupProvider>,
        fetcher: PageFetcher,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            provider,
            fetcher,
            keyword: keyword.into(),
            suffix: None,
            archive: None,
        }
    }

    /// Append a fixed word to every query (`news` for the news provider).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Archive every fetched document.
    pub fn with_archive(mut self, archive: Arc<dyn DebugArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Queries in cascade order, textual duplicates removed.
    pub fn queries(&self, variants: &NameVariants, hint: Option<&str>) -> Vec<String> {
        let hint = hint.map(str::trim).filter(|h| !h.is_empty());
        let mut queries: Vec<String> = Vec::with_capacity(3);

        for (variant, hint) in [
            (&variants.full, None),
            (&variants.simple, hint),
            (&variants.distinctive, hint),
        ] {
            if variant.trim().is_empty() {
                continue;
            }
            let mut query = format!("{variant} {}", self.keyword);
            if let Some(h) = hint {
                query.push(' ');
                query.push_str(h);
            }
            if let Some(s) = &self.suffix {
                query.push(' ');
                query.push_str(s);
            }
            if !queries.contains(&query) {
                queries.push(query);
            }
        }
        queries
    }

    /// Run the cascade. Lookup failures count as "no candidate"; a top
    /// candidate whose document cannot be fetched ends in `NotFound`.
    #[instrument(skip_all, fields(namespace = %self.namespace, provider = self.provider.name(), name = %variants.full))]
    pub async fn resolve(&self, variants: &NameVariants, hint: Option<&str>) -> Resolution {
        for query in self.queries(variants, hint) {
            debug!(%query, "lookup");
            let candidates = match self.provider.query(&query).await {
                Ok(c) if !c.is_empty() => c,
                Ok(_) => continue,
                Err(e) => {
                    warn!(%query, error = %e, "lookup failed");
                    continue;
                }
            };
            return self.fetch_top(query, candidates).await;
        }

        debug!("no candidates for any variant");
        Resolution::NotFound
    }

    async fn fetch_top(&self, query: String, candidates: Vec<Candidate>) -> Resolution {
        let Ok(url) = Url::parse(&candidates[0].url) else {
            warn!(%query, url = %candidates[0].url, "top candidate is not a valid URL");
            return Resolution::NotFound;
        };

        match self.fetcher.fetch(&url).await {
            Ok(document) => {
                if let Some(archive) = &self.archive {
                    archive.store(&document.url, &document.body);
                }
                info!(%query, %url, "resolved");
                Resolution::Found(ResolvedDocument {
                    query,
                    candidates,
                    document,
                })
            }
            Err(e) => {
                warn!(%query, error = %e, "top candidate could not be fetched");
                Resolution::NotFound
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use roster_fetch::{DocumentStore, RetryPolicy};
    use roster_shared::TransportError;

    /// Answers from a fixed table and records every query it sees.
    #[derive(Default)]
    struct ScriptedProvider {
        answers: HashMap<String, Result<Vec<Candidate>, TransportError>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn hit(mut self, query: &str, url: &str) -> Self {
            self.answers
                .insert(query.into(), Ok(vec![Candidate::from_url(url)]));
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.answers
                .insert(query.into(), Err(TransportError::new(query, "connection reset")));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LookupProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn query(&self, text: &str) -> Result<Vec<Candidate>, TransportError> {
            self.calls.lock().unwrap().push(text.to_string());
            self.answers.get(text).cloned().unwrap_or(Ok(Vec::new()))
        }
    }

    /// Serves one body for every URL, or fails every request.
    struct StaticStore(Option<&'static str>);

    #[async_trait]
    impl DocumentStore for StaticStore {
        async fn get(&self, reference: &Url) -> Result<String, TransportError> {
            self.0
                .map(String::from)
                .ok_or_else(|| TransportError::new(reference.as_str(), "HTTP 404"))
        }
    }

    #[derive(Default)]
    struct RecordingArchive(Mutex<Vec<String>>);

    impl DebugArchive for RecordingArchive {
        fn store(&self, reference: &Url, _body: &str) {
            self.0.lock().unwrap().push(reference.to_string());
        }
    }

    fn variants() -> NameVariants {
        NameVariants {
            full: "A".into(),
            simple: "B".into(),
            distinctive: "C".into(),
        }
    }

    fn resolver(provider: Arc<ScriptedProvider>, body: Option<&'static str>) -> SourceResolver {
        let fetcher = PageFetcher::new(
            Arc::new(StaticStore(body)),
            RetryPolicy::new(2, Duration::ZERO),
        );
        SourceResolver::new(Namespace::Encyclopedia, provider, fetcher, "cardinal")
    }

    #[tokio::test]
    async fn first_success_stops_the_cascade() {
        let provider =
            Arc::new(ScriptedProvider::default().hit("B cardinal", "https://example.org/b"));
        let resolution = resolver(provider.clone(), Some("<p>B</p>"))
            .resolve(&variants(), None)
            .await;

        assert_eq!(provider.calls(), vec!["A cardinal", "B cardinal"]);
        let found = resolution.found().expect("found");
        assert_eq!(found.query, "B cardinal");
        assert_eq!(found.document.body, "<p>B</p>");
        assert_eq!(found.candidates.len(), 1);
    }

    #[tokio::test]
    async fn lookup_error_moves_to_next_variant() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .fail("A cardinal")
                .hit("B cardinal", "https://example.org/b"),
        );
        let resolution = resolver(provider.clone(), Some("ok"))
            .resolve(&variants(), None)
            .await;

        assert!(resolution.is_found());
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test]
    async fn always_failing_provider_is_not_found() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .fail("A cardinal")
                .fail("B cardinal")
                .fail("C cardinal"),
        );
        let resolution = resolver(provider.clone(), Some("ok"))
            .resolve(&variants(), None)
            .await;

        assert!(!resolution.is_found());
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test]
    async fn unfetchable_document_is_not_found() {
        let provider =
            Arc::new(ScriptedProvider::default().hit("A cardinal", "https://example.org/a"));
        let resolution = resolver(provider.clone(), None)
            .resolve(&variants(), None)
            .await;

        assert!(!resolution.is_found());
        // The cascade ends at the first candidate even if its fetch fails.
        assert_eq!(provider.calls(), vec!["A cardinal"]);
    }

    #[tokio::test]
    async fn fetched_documents_are_archived() {
        let provider =
            Arc::new(ScriptedProvider::default().hit("A cardinal", "https://example.org/a"));
        let archive = Arc::new(RecordingArchive::default());
        let resolver = resolver(provider, Some("body")).with_archive(archive.clone());

        assert!(resolver.resolve(&variants(), None).await.is_found());
        assert_eq!(*archive.0.lock().unwrap(), vec!["https://example.org/a"]);
    }

    #[test]
    fn hint_applies_after_the_full_name() {
        let provider = Arc::new(ScriptedProvider::default());
        let queries = resolver(provider, None).queries(&variants(), Some("Philippines"));
        assert_eq!(
            queries,
            vec!["A cardinal", "B cardinal Philippines", "C cardinal Philippines"]
        );
    }

    #[test]
    fn suffix_closes_every_query() {
        let provider = Arc::new(ScriptedProvider::default());
        let queries = resolver(provider, None)
            .with_suffix("news")
            .queries(&variants(), Some("Italy"));
        assert_eq!(
            queries,
            vec!["A cardinal news", "B cardinal Italy news", "C cardinal Italy news"]
        );
    }

    #[tokio::test]
    async fn duplicate_queries_are_looked_up_once() {
        let provider = Arc::new(ScriptedProvider::default());
        let single = NameVariants {
            full: "Tagle".into(),
            simple: "Tagle".into(),
            distinctive: "Tagle".into(),
        };
        let resolution = resolver(provider.clone(), None)
            .resolve(&single, Some("  "))
            .await;

        assert!(!resolution.is_found());
        assert_eq!(provider.calls(), vec!["Tagle cardinal"]);
    }
}
