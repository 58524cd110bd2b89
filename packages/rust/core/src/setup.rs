//! Assembling an orchestrator from configuration.

use std::sync::Arc;

use roster_fetch::{
    DebugArchive, DocumentStore, FsDebugArchive, HttpDocumentStore, PageFetcher, RateGate,
    RetryPolicy,
};
use roster_resolver::{OpenSearchProvider, SourceResolver, WebSearchProvider};
use roster_shared::{AppConfig, EnrichConfig, Namespace, Result, RosterError};
use roster_storage::CheckpointStore;
use tracing::debug;
use url::Url;

use crate::orchestrator::EnrichmentOrchestrator;

/// Query suffix for the news provider.
const NEWS_SUFFIX: &str = "news";

/// One resolver per enabled provider, in namespace order, sharing one HTTP
/// store and one retry policy.
pub fn build_resolvers(app: &AppConfig, enrich: &EnrichConfig) -> Result<Vec<SourceResolver>> {
    let store: Arc<dyn DocumentStore> =
        Arc::new(HttpDocumentStore::new(&enrich.user_agent, enrich.timeout)?);
    build_resolvers_with(app, enrich, store)
}

/// Like [`build_resolvers`], over a caller-supplied document store.
pub fn build_resolvers_with(
    app: &AppConfig,
    enrich: &EnrichConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<Vec<SourceResolver>> {
    let fetcher = PageFetcher::new(Arc::clone(&store), RetryPolicy::from(enrich));
    let archive: Option<Arc<dyn DebugArchive>> = if app.archive.enabled {
        Some(Arc::new(FsDebugArchive::new(&app.archive.dir)?))
    } else {
        None
    };

    let providers = &app.providers;
    let mut resolvers = Vec::new();

    if providers.encyclopedia.enabled {
        let endpoint = endpoint("encyclopedia", &providers.encyclopedia.endpoint)?;
        let provider = OpenSearchProvider::new(Arc::clone(&store), endpoint)
            .with_limit(providers.encyclopedia.max_hits);
        resolvers.push(SourceResolver::new(
            Namespace::Encyclopedia,
            Arc::new(provider),
            fetcher.clone(),
            &enrich.keyword,
        ));
    }

    if providers.news.enabled {
        let endpoint = endpoint("news", &providers.news.endpoint)?;
        let provider =
            WebSearchProvider::news(Arc::clone(&store), endpoint, providers.news.max_hits);
        resolvers.push(
            SourceResolver::new(
                Namespace::News,
                Arc::new(provider),
                fetcher.clone(),
                &enrich.keyword,
            )
            .with_suffix(NEWS_SUFFIX),
        );
    }

    if providers.search.enabled {
        let endpoint = endpoint("search", &providers.search.endpoint)?;
        let provider =
            WebSearchProvider::general(Arc::clone(&store), endpoint, providers.search.max_hits);
        resolvers.push(SourceResolver::new(
            Namespace::GeneralSearch,
            Arc::new(provider),
            fetcher.clone(),
            &enrich.keyword,
        ));
    }

    if let Some(archive) = archive {
        resolvers = resolvers
            .into_iter()
            .map(|r| r.with_archive(Arc::clone(&archive)))
            .collect();
    }

    debug!(count = resolvers.len(), "resolvers configured");
    Ok(resolvers)
}

/// A ready-to-run orchestrator: configured resolvers, politeness gate and
/// checkpoint cadence.
pub fn build_orchestrator(
    app: &AppConfig,
    enrich: &EnrichConfig,
    checkpoints: Arc<dyn CheckpointStore>,
) -> Result<EnrichmentOrchestrator> {
    let gate = Arc::new(RateGate::per_interval(enrich.politeness));
    let orchestrator = build_resolvers(app, enrich)?
        .into_iter()
        .fold(EnrichmentOrchestrator::new(checkpoints, gate), |o, r| {
            o.with_resolver(r)
        })
        .checkpoint_every(enrich.checkpoint_every);
    Ok(orchestrator)
}

fn endpoint(provider: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        RosterError::config(format!("invalid endpoint for provider '{provider}': {raw} ({e})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_all_resolvers() {
        let app = AppConfig::default();
        let resolvers = build_resolvers(&app, &EnrichConfig::from(&app)).unwrap();
        let namespaces: Vec<Namespace> = resolvers.iter().map(|r| r.namespace()).collect();
        assert_eq!(
            namespaces,
            vec![Namespace::Encyclopedia, Namespace::News, Namespace::GeneralSearch]
        );
    }

    #[test]
    fn disabled_providers_are_left_out() {
        let mut app = AppConfig::default();
        app.providers.news.enabled = false;
        let resolvers = build_resolvers(&app, &EnrichConfig::from(&app)).unwrap();
        assert_eq!(resolvers.len(), 2);
        assert!(resolvers.iter().all(|r| r.namespace() != Namespace::News));
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let mut app = AppConfig::default();
        app.providers.search.endpoint = "not a url".into();
        let err = build_resolvers(&app, &EnrichConfig::from(&app)).err().unwrap();
        assert!(matches!(err, RosterError::Config { .. }));
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn orchestrator_expects_every_namespace() {
        struct NoCheckpoints;
        impl CheckpointStore for NoCheckpoints {
            fn write(&self, _snapshot: &roster_shared::BatchSnapshot) -> Result<()> {
                Ok(())
            }
            fn read_latest(&self) -> Result<Option<roster_shared::BatchSnapshot>> {
                Ok(None)
            }
        }

        let app = AppConfig::default();
        let orchestrator =
            build_orchestrator(&app, &EnrichConfig::from(&app), Arc::new(NoCheckpoints)).unwrap();
        assert_eq!(orchestrator.namespaces(), Namespace::ALL.to_vec());
    }
}
