//! Encyclopedia lookup through the OpenSearch suggestion API.

use std::sync::Arc;

use async_trait::async_trait;
use roster_fetch::DocumentStore;
use roster_shared::{Candidate, TransportError};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::LookupProvider;

/// Queries `{endpoint}?action=opensearch&search=..&limit=..&namespace=0&format=json`.
///
/// The response is a four-element array `[query, titles, descriptions, urls]`.
pub struct OpenSearchProvider {
    store: Arc<dyn DocumentStore>,
    endpoint: Url,
    limit: usize,
}

impl OpenSearchProvider {
    /// Provider returning the single best article.
    pub fn new(store: Arc<dyn DocumentStore>, endpoint: Url) -> Self {
        Self {
            store,
            endpoint,
            limit: 1,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    fn request_url(&self, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "opensearch")
            .append_pair("search", text)
            .append_pair("limit", &self.limit.to_string())
            .append_pair("namespace", "0")
            .append_pair("format", "json");
        url
    }
}

#[async_trait]
impl LookupProvider for OpenSearchProvider {
    fn name(&self) -> &str {
        "opensearch"
    }

    async fn query(&self, text: &str) -> Result<Vec<Candidate>, TransportError> {
        let url = self.request_url(text);
        let body = self.store.get(&url).await?;
        let mut candidates = parse_response(&body)
            .map_err(|message| TransportError::new(url.as_str(), message))?;
        candidates.truncate(self.limit);
        debug!(query = text, found = candidates.len(), "opensearch lookup");
        Ok(candidates)
    }
}

/// Parse the suggestion array. A short array means no match; anything that
/// is not an array is a malformed response.
fn parse_response(body: &str) -> Result<Vec<Candidate>, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("malformed opensearch response: {e}"))?;
    let parts = value
        .as_array()
        .ok_or_else(|| "opensearch response is not an array".to_string())?;

    let titles = column(parts, 1);
    let descriptions = column(parts, 2);
    let urls = column(parts, 3);

    let candidates = urls
        .iter()
        .enumerate()
        .filter(|(_, u)| Url::parse(u).is_ok())
        .map(|(i, u)| Candidate {
            url: (*u).to_string(),
            title: non_empty(titles.get(i).copied()),
            snippet: non_empty(descriptions.get(i).copied()),
            ..Default::default()
        })
        .collect();
    Ok(candidates)
}

fn column(parts: &[Value], i: usize) -> Vec<&str> {
    parts
        .get(i)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(|v| v.as_str().unwrap_or_default()).collect())
        .unwrap_or_default()
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use roster_fetch::HttpDocumentStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenSearchProvider {
        let store = HttpDocumentStore::new("roster-test", Duration::from_secs(2)).unwrap();
        let endpoint = Url::parse(&format!("{}/w/api.php", server.uri())).unwrap();
        OpenSearchProvider::new(Arc::new(store), endpoint)
    }

    #[test]
    fn parses_suggestion_array() {
        let body = std::fs::read_to_string("../../../fixtures/json/opensearch.fixture.json")
            .expect("missing opensearch fixture");
        let candidates = parse_response(&body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].url,
            "https://en.wikipedia.org/wiki/Luis_Antonio_Tagle"
        );
        assert_eq!(candidates[0].title.as_deref(), Some("Luis Antonio Tagle"));
        assert_eq!(
            candidates[0].snippet.as_deref(),
            Some("Filipino Catholic cardinal")
        );
    }

    #[test]
    fn empty_columns_mean_no_match() {
        assert!(parse_response(r#"["Nobody cardinal",[],[],[]]"#).unwrap().is_empty());
        assert!(parse_response(r#"["Nobody cardinal"]"#).unwrap().is_empty());
    }

    #[test]
    fn non_array_is_malformed() {
        assert!(parse_response(r#"{"error":"bad"}"#).is_err());
        assert!(parse_response("<html>").is_err());
    }

    #[tokio::test]
    async fn query_sends_opensearch_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "opensearch"))
            .and(query_param("search", "Luis Antonio Tagle cardinal"))
            .and(query_param("limit", "1"))
            .and(query_param("namespace", "0"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"["q",["Luis Antonio Tagle"],[""],["https://en.example.org/wiki/Tagle"]]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let candidates = provider(&server)
            .query("Luis Antonio Tagle cardinal")
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].snippet.is_none());
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        assert!(provider(&server).query("Tagle cardinal").await.is_err());
    }
}
