//! Best-effort field extraction from fetched markup and biography prose.
//!
//! Every field is independent: a missing table never blocks the summary, a
//! rule that does not match never blocks its siblings.

pub mod bio;
pub mod html;
pub mod text;

pub use bio::{AllMatches, BioField, BioRule, FirstMatch, SplitList, TextFieldExtractor};
pub use html::{HtmlFieldExtractor, PartialFields};
pub use text::normalize_text;
