//! Text normalization shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;

/// Collapse whitespace runs and drop bracketed footnote markers like `[1]`.
pub fn normalize_text(raw: &str) -> String {
    static FOOTNOTE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[(?:\d+|[a-z]|note \d+)\]").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let without_notes = FOOTNOTE_RE.replace_all(raw, "");
    WS_RE.replace_all(&without_notes, " ").trim().to_string()
}
