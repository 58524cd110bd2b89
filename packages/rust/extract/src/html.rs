//! Summary, fact table and media reference extraction from article markup.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use roster_fetch::Document;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::text::normalize_text;

static PARAGRAPH_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static HEADER_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("valid selector"));
static VALUE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static IMAGE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));

/// Default fact table selector (encyclopedia infobox).
const FACT_TABLE: &str = "table.infobox";

/// Fields pulled from one document. Any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFields {
    /// First non-empty paragraph.
    pub summary: Option<String>,
    /// Header cell → value cell pairs from the fact table.
    pub facts: BTreeMap<String, String>,
    /// Absolute URL of the fact table's first image.
    pub media_url: Option<String>,
}

impl PartialFields {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.facts.is_empty() && self.media_url.is_none()
    }
}

/// Extracts [`PartialFields`] from a document's markup.
pub struct HtmlFieldExtractor {
    fact_table: Selector,
}

impl HtmlFieldExtractor {
    /// Extractor using the encyclopedia infobox as the fact table.
    pub fn new() -> Self {
        Self {
            fact_table: Selector::parse(FACT_TABLE).expect("valid selector"),
        }
    }

    /// Use a different CSS selector for the fact table.
    /// Returns `None` if the selector does not parse.
    pub fn with_fact_table(selector: &str) -> Option<Self> {
        Selector::parse(selector)
            .ok()
            .map(|fact_table| Self { fact_table })
    }

    /// Extract every field that is present; absent structure is omitted.
    pub fn extract(&self, document: &Document) -> PartialFields {
        let doc = Html::parse_document(&document.body);
        let table = doc.select(&self.fact_table).next();

        let fields = PartialFields {
            summary: first_paragraph(&doc),
            facts: table.map(fact_rows).unwrap_or_default(),
            media_url: table.and_then(|t| media_reference(t, document)),
        };

        if fields.summary.is_none() {
            debug!(url = %document.url, "no summary paragraph");
        }
        if table.is_none() {
            debug!(url = %document.url, "no fact table");
        }
        fields
    }
}

impl Default for HtmlFieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_paragraph(doc: &Html) -> Option<String> {
    doc.select(&PARAGRAPH_SEL)
        .map(|p| normalize_text(&p.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

fn fact_rows(table: ElementRef<'_>) -> BTreeMap<String, String> {
    let mut facts = BTreeMap::new();
    for row in table.select(&ROW_SEL) {
        let (Some(header), Some(value)) = (
            row.select(&HEADER_SEL).next(),
            row.select(&VALUE_SEL).next(),
        ) else {
            continue;
        };
        let key = normalize_text(&header.text().collect::<String>());
        let value = normalize_text(&value.text().collect::<String>());
        if key.is_empty() || value.is_empty() {
            continue;
        }
        facts.entry(key).or_insert(value);
    }
    facts
}

fn media_reference(table: ElementRef<'_>, document: &Document) -> Option<String> {
    let src = table
        .select(&IMAGE_SEL)
        .next()
        .and_then(|img| img.value().attr("src"))?
        .trim();

    if src.is_empty() {
        return None;
    }
    if let Some(rest) = src.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    document.url.join(src).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc(body: &str) -> Document {
        Document {
            url: Url::parse("https://en.example.org/wiki/Luis_Antonio_Tagle").unwrap(),
            body: body.to_string(),
        }
    }

    fn load_fixture(name: &str) -> Document {
        let path = format!("../../../fixtures/html/{name}");
        let body = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("missing fixture: {path}"));
        doc(&body)
    }

    #[test]
    fn extracts_all_fields_from_article() {
        let fields = HtmlFieldExtractor::new().extract(&load_fixture("encyclopedia.html"));

        let summary = fields.summary.expect("summary");
        assert!(summary.starts_with("Luis Antonio Gokim Tagle"));
        assert!(!summary.contains("[1]"));

        assert_eq!(fields.facts.get("Born").map(String::as_str), Some("21 June 1957 Manila, Philippines"));
        assert_eq!(fields.facts.get("Ordination").map(String::as_str), Some("27 February 1982"));
        assert!(!fields.facts.contains_key("Styles"));

        assert_eq!(
            fields.media_url.as_deref(),
            Some("https://upload.example.org/images/Tagle.jpg")
        );
    }

    #[test]
    fn skips_empty_paragraphs() {
        let fields = HtmlFieldExtractor::new()
            .extract(&doc("<p class=\"mw-empty-elt\">\n</p><p>  Second  paragraph. </p>"));
        assert_eq!(fields.summary.as_deref(), Some("Second paragraph."));
    }

    #[test]
    fn missing_table_keeps_summary() {
        let fields = HtmlFieldExtractor::new().extract(&doc("<html><body><p>Only text.</p></body></html>"));
        assert_eq!(fields.summary.as_deref(), Some("Only text."));
        assert!(fields.facts.is_empty());
        assert!(fields.media_url.is_none());
    }

    #[test]
    fn missing_summary_keeps_table() {
        let html = r#"<table class="infobox"><tr><th>Church</th><td>Catholic</td></tr></table>"#;
        let fields = HtmlFieldExtractor::new().extract(&doc(html));
        assert!(fields.summary.is_none());
        assert_eq!(fields.facts.get("Church").map(String::as_str), Some("Catholic"));
    }

    #[test]
    fn relative_media_is_joined_to_document_url() {
        let html = r#"<table class="infobox"><tr><td><img src="/static/photo.png"></td></tr></table>"#;
        let fields = HtmlFieldExtractor::new().extract(&doc(html));
        assert_eq!(
            fields.media_url.as_deref(),
            Some("https://en.example.org/static/photo.png")
        );
    }

    #[test]
    fn empty_document_yields_nothing() {
        let fields = HtmlFieldExtractor::new().extract(&doc(""));
        assert!(fields.is_empty());
    }

    #[test]
    fn custom_fact_table_selector() {
        let html = r#"<table class="facts"><tr><th>Title</th><td>Archbishop</td></tr></table>"#;
        let fields = HtmlFieldExtractor::with_fact_table("table.facts")
            .unwrap()
            .extract(&doc(html));
        assert_eq!(fields.facts.len(), 1);
        assert!(HtmlFieldExtractor::with_fact_table("table[").is_none());
    }
}
