//! Turning resolved documents into namespace payloads.

use roster_extract::{HtmlFieldExtractor, TextFieldExtractor};
use roster_resolver::ResolvedDocument;
use roster_shared::{EncyclopediaEntry, EnrichmentPayload, Namespace, SearchDigest};

/// Build the payload a resolver's namespace stores.
///
/// Returns `None` for `structuredBio`, which is never resolver-driven.
pub fn from_resolved(
    namespace: Namespace,
    resolved: ResolvedDocument,
    html: &HtmlFieldExtractor,
) -> Option<EnrichmentPayload> {
    let fields = html.extract(&resolved.document);
    let url = resolved.document.url.to_string();

    match namespace {
        Namespace::Encyclopedia => Some(EnrichmentPayload::Encyclopedia(EncyclopediaEntry {
            query: resolved.query,
            url,
            summary: fields.summary,
            facts: fields.facts,
            image_url: fields.media_url,
        })),
        Namespace::News | Namespace::GeneralSearch => {
            let digest = SearchDigest {
                query: resolved.query,
                url,
                hits: resolved.candidates,
                summary: fields.summary,
            };
            Some(if namespace == Namespace::News {
                EnrichmentPayload::News(digest)
            } else {
                EnrichmentPayload::GeneralSearch(digest)
            })
        }
        Namespace::StructuredBio => None,
    }
}

/// Run the prose rules over `text`. An empty result is still returned; the
/// merge policy drops it.
pub fn structured_bio(text: &str, bio: &TextFieldExtractor) -> EnrichmentPayload {
    EnrichmentPayload::StructuredBio(bio.extract(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_fetch::Document;
    use roster_shared::Candidate;
    use url::Url;

    fn resolved(body: &str) -> ResolvedDocument {
        ResolvedDocument {
            query: "Luis Antonio Tagle cardinal".into(),
            candidates: vec![
                Candidate::from_url("https://en.example.org/wiki/Tagle"),
                Candidate::from_url("https://other.example.org/tagle"),
            ],
            document: Document {
                url: Url::parse("https://en.example.org/wiki/Tagle").unwrap(),
                body: body.into(),
            },
        }
    }

    #[test]
    fn encyclopedia_payload_carries_article_fields() {
        let html = r#"<p>Tagle is a prelate.</p>
            <table class="infobox"><tr><th>Born</th><td>1957</td></tr></table>"#;
        let payload =
            from_resolved(Namespace::Encyclopedia, resolved(html), &HtmlFieldExtractor::new())
                .unwrap();

        let EnrichmentPayload::Encyclopedia(entry) = payload else {
            panic!("expected encyclopedia payload");
        };
        assert_eq!(entry.url, "https://en.example.org/wiki/Tagle");
        assert_eq!(entry.summary.as_deref(), Some("Tagle is a prelate."));
        assert_eq!(entry.facts.get("Born").map(String::as_str), Some("1957"));
    }

    #[test]
    fn search_payloads_keep_every_hit() {
        let extractor = HtmlFieldExtractor::new();
        let news = from_resolved(Namespace::News, resolved("<p>Story.</p>"), &extractor).unwrap();
        let EnrichmentPayload::News(digest) = news else {
            panic!("expected news payload");
        };
        assert_eq!(digest.hits.len(), 2);
        assert_eq!(digest.summary.as_deref(), Some("Story."));

        let general =
            from_resolved(Namespace::GeneralSearch, resolved(""), &extractor).unwrap();
        assert_eq!(general.namespace(), Namespace::GeneralSearch);
    }

    #[test]
    fn structured_bio_is_not_resolver_driven() {
        assert!(
            from_resolved(Namespace::StructuredBio, resolved(""), &HtmlFieldExtractor::new())
                .is_none()
        );
    }

    #[test]
    fn empty_prose_yields_empty_payload() {
        let payload = structured_bio("Nothing to see.", &TextFieldExtractor::new());
        assert!(payload.is_empty());
    }
}
