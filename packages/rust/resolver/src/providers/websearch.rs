//! Web and news search lookups scraped from a results page.

use std::sync::Arc;

use async_trait::async_trait;
use roster_extract::normalize_text;
use roster_fetch::DocumentStore;
use roster_shared::{Candidate, TransportError};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::LookupProvider;

/// Separator between publisher and date in a news result's source line.
const SOURCE_SEPARATOR: &str = " · ";

// ---------------------------------------------------------------------------
// ResultLayout
// ---------------------------------------------------------------------------

/// Where hits live on a results page.
///
/// `blocks` is an ordered cascade: the first selector that matches anything
/// decides the result blocks. The remaining selectors are applied inside
/// each block.
pub struct ResultLayout {
    blocks: Vec<Selector>,
    title: Selector,
    link: Selector,
    snippet: Selector,
    source_line: Option<Selector>,
}

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

impl ResultLayout {
    /// News results: publisher and date share one line.
    pub fn news() -> Self {
        Self {
            blocks: vec![sel("div.SoaBEf"), sel("div.y6IFtc"), sel("div.v7W49e")],
            title: sel("[role=heading], .mCBkyc, .DY5T1d, h3"),
            link: sel("a[href]"),
            snippet: sel(".GI74Re, .Y3v8qd"),
            source_line: Some(sel(".OSrXXb, .CEMjEf, .UMOHqf")),
        }
    }

    /// Organic web results.
    pub fn general() -> Self {
        Self {
            blocks: vec![sel("div.g, div.tF2Cxc"), sel("div.yuRUbf"), sel("div.v7W49e")],
            title: sel("h3"),
            link: sel("a[href]"),
            snippet: sel(".VwiC3b, .aCOpRe, .yXK7lf"),
            source_line: None,
        }
    }

    /// Up to `max_hits` candidates in page order. Blocks without a usable
    /// link are dropped.
    pub fn parse(&self, body: &str, base: &Url, max_hits: usize) -> Vec<Candidate> {
        let doc = Html::parse_document(body);

        let blocks: Vec<ElementRef<'_>> = self
            .blocks
            .iter()
            .map(|s| doc.select(s).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default();

        blocks
            .into_iter()
            .filter_map(|block| self.candidate(block, base))
            .take(max_hits)
            .collect()
    }

    fn candidate(&self, block: ElementRef<'_>, base: &Url) -> Option<Candidate> {
        let href = block.select(&self.link).next()?.value().attr("href")?;
        let url = result_url(href, base)?;

        let (source, published) = match &self.source_line {
            Some(s) => first_text(block, s)
                .map(|line| split_source_line(&line))
                .unwrap_or_default(),
            None => (None, None),
        };

        Some(Candidate {
            url: url.to_string(),
            title: first_text(block, &self.title),
            snippet: first_text(block, &self.snippet),
            source,
            published,
        })
    }
}

fn first_text(block: ElementRef<'_>, selector: &Selector) -> Option<String> {
    block
        .select(selector)
        .map(|el| normalize_text(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Resolve a result link, unwrapping `/url?q=<target>` redirects.
fn result_url(href: &str, base: &Url) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    let url = if url.path() == "/url" {
        url.query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .and_then(|(_, v)| Url::parse(&v).ok())?
    } else {
        url
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// `"Publisher · 2 days ago"` → (`Publisher`, `2 days ago`).
fn split_source_line(line: &str) -> (Option<String>, Option<String>) {
    match line.split_once(SOURCE_SEPARATOR) {
        Some((source, date)) => (non_empty(source), non_empty(date)),
        None => (non_empty(line), None),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ---------------------------------------------------------------------------
// WebSearchProvider
// ---------------------------------------------------------------------------

/// Queries `{endpoint}?q=..` plus fixed parameters and scrapes the result page.
pub struct WebSearchProvider {
    name: &'static str,
    store: Arc<dyn DocumentStore>,
    endpoint: Url,
    params: Vec<(String, String)>,
    max_hits: usize,
    layout: ResultLayout,
}

impl WebSearchProvider {
    /// News search (`tbm=nws`).
    pub fn news(store: Arc<dyn DocumentStore>, endpoint: Url, max_hits: usize) -> Self {
        Self {
            name: "news",
            store,
            endpoint,
            params: vec![("tbm".into(), "nws".into())],
            max_hits,
            layout: ResultLayout::news(),
        }
    }

    /// General web search.
    pub fn general(store: Arc<dyn DocumentStore>, endpoint: Url, max_hits: usize) -> Self {
        Self {
            name: "search",
            store,
            endpoint,
            params: Vec::new(),
            max_hits,
            layout: ResultLayout::general(),
        }
    }

    fn request_url(&self, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", text);
            for (k, v) in &self.params {
                pairs.append_pair(k, v);
            }
        }
        url
    }
}

#[async_trait]
impl LookupProvider for WebSearchProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn query(&self, text: &str) -> Result<Vec<Candidate>, TransportError> {
        let url = self.request_url(text);
        let body = self.store.get(&url).await?;
        let hits = self.layout.parse(&body, &url, self.max_hits);
        debug!(provider = self.name, query = text, found = hits.len(), "web lookup");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use roster_fetch::HttpDocumentStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn load_fixture(name: &str) -> String {
        let path = format!("../../../fixtures/html/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn base() -> Url {
        Url::parse("https://search.example.com/search?q=x").unwrap()
    }

    #[test]
    fn news_layout_splits_source_line() {
        let hits = ResultLayout::news().parse(&load_fixture("news_results.html"), &base(), 5);
        assert_eq!(hits.len(), 2);

        assert_eq!(hits[0].url, "https://news.example.com/2024/tagle-visit");
        assert_eq!(
            hits[0].title.as_deref(),
            Some("Cardinal Tagle visits Manila parishes")
        );
        assert!(hits[0].snippet.as_deref().unwrap().starts_with("The pro-prefect"));
        assert_eq!(hits[0].source.as_deref(), Some("Example News"));
        assert_eq!(hits[0].published.as_deref(), Some("2 days ago"));

        assert_eq!(hits[1].source.as_deref(), Some("Example Wire"));
    }

    #[test]
    fn general_layout_reads_organic_results() {
        let hits = ResultLayout::general().parse(&load_fixture("search_results.html"), &base(), 3);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.example.va/content/tagle.html");
        assert_eq!(hits[0].title.as_deref(), Some("Tagle Card. Luis Antonio Gokim"));
        assert!(hits[1].snippet.as_deref().unwrap().contains("Manila"));
        assert!(hits[0].source.is_none());
    }

    #[test]
    fn hit_limit_applies() {
        let hits = ResultLayout::news().parse(&load_fixture("news_results.html"), &base(), 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn block_selector_cascade_falls_through() {
        let html = r#"<div class="v7W49e"><a href="https://a.example.org/x"><h3>Fallback</h3></a></div>"#;
        let hits = ResultLayout::general().parse(html, &base(), 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.as_deref(), Some("Fallback"));
    }

    #[test]
    fn redirect_links_are_unwrapped() {
        let url = result_url("/url?q=https://target.example.org/page&sa=U", &base()).unwrap();
        assert_eq!(url.as_str(), "https://target.example.org/page");
        assert!(result_url("javascript:void(0)", &base()).is_none());
    }

    #[test]
    fn source_line_without_date() {
        assert_eq!(
            split_source_line("Example News"),
            (Some("Example News".into()), None)
        );
    }

    #[tokio::test]
    async fn news_query_sends_search_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Luis Tagle cardinal news"))
            .and(query_param("tbm", "nws"))
            .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("news_results.html")))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new("roster-test", Duration::from_secs(2)).unwrap();
        let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();
        let provider = WebSearchProvider::news(Arc::new(store), endpoint, 5);

        let hits = provider.query("Luis Tagle cardinal news").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(provider.name(), "news");
    }

    #[tokio::test]
    async fn empty_page_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let store = HttpDocumentStore::new("roster-test", Duration::from_secs(2)).unwrap();
        let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();
        let provider = WebSearchProvider::general(Arc::new(store), endpoint, 3);

        assert!(provider.query("Nobody cardinal").await.unwrap().is_empty());
    }
}
