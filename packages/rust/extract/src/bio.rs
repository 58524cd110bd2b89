//! Pattern rules over biography prose.
//!
//! Each [`BioRule`] looks for one fact and either finds it unambiguously or
//! returns nothing. Rules never see each other's results. A miss is an
//! extraction gap: logged at debug, never an error.

use std::sync::LazyLock;

use regex::Regex;
use roster_shared::StructuredBio;
use tracing::debug;

/// Where a captured phrase ends: punctuation, newline, end of text, or a
/// following conjunction.
const END: &str = r"(?:\s+and\b|[,.;\n]|$)";

/// Like [`END`], but also stops a date before a trailing prepositional phrase.
const DATE_END: &str = r"(?:\s+(?:and|for|by|at|in)\b|[,.;\n]|$)";

/// One extracted fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BioField {
    BirthPlace(String),
    OrdinationDate(String),
    EpiscopalConsecrationDate(String),
    ElevationDate(String),
    Education(Vec<String>),
    Languages(Vec<String>),
}

impl BioField {
    fn apply_to(self, bio: &mut StructuredBio) {
        match self {
            Self::BirthPlace(v) => bio.birth_place = Some(v),
            Self::OrdinationDate(v) => bio.ordination_date = Some(v),
            Self::EpiscopalConsecrationDate(v) => bio.episcopal_consecration_date = Some(v),
            Self::ElevationDate(v) => bio.elevation_date = Some(v),
            Self::Education(v) => bio.education = v,
            Self::Languages(v) => bio.languages = v,
        }
    }
}

/// A single independent extraction rule.
pub trait BioRule: Send + Sync {
    /// Rule name for tracing.
    fn name(&self) -> &str;

    /// Look for this rule's fact in `text`.
    fn apply(&self, text: &str) -> Option<BioField>;
}

// ---------------------------------------------------------------------------
// Rule shapes
// ---------------------------------------------------------------------------

/// First match of a pattern, capture group 1.
pub struct FirstMatch {
    name: &'static str,
    pattern: Regex,
    field: fn(String) -> BioField,
}

impl FirstMatch {
    pub fn new(name: &'static str, pattern: Regex, field: fn(String) -> BioField) -> Self {
        Self {
            name,
            pattern,
            field,
        }
    }
}

impl BioRule for FirstMatch {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, text: &str) -> Option<BioField> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| (self.field)(value.to_string()))
    }
}

/// Every non-overlapping match of a pattern, capture group 1 each.
pub struct AllMatches {
    name: &'static str,
    pattern: Regex,
    field: fn(Vec<String>) -> BioField,
}

impl AllMatches {
    pub fn new(name: &'static str, pattern: Regex, field: fn(Vec<String>) -> BioField) -> Self {
        Self {
            name,
            pattern,
            field,
        }
    }
}

impl BioRule for AllMatches {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, text: &str) -> Option<BioField> {
        let values: Vec<String> = self
            .pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        (!values.is_empty()).then(|| (self.field)(values))
    }
}

/// First match of a pattern, split on commas and the word "and".
pub struct SplitList {
    name: &'static str,
    pattern: Regex,
    field: fn(Vec<String>) -> BioField,
}

impl SplitList {
    pub fn new(name: &'static str, pattern: Regex, field: fn(Vec<String>) -> BioField) -> Self {
        Self {
            name,
            pattern,
            field,
        }
    }
}

impl BioRule for SplitList {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, text: &str) -> Option<BioField> {
        static SPLIT_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?i),|\band\b").expect("valid regex"));

        let caps = self.pattern.captures(text)?;
        let items: Vec<String> = SPLIT_RE
            .split(caps.get(1)?.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        (!items.is_empty()).then(|| (self.field)(items))
    }
}

// ---------------------------------------------------------------------------
// Default rules
// ---------------------------------------------------------------------------

fn rule_regex(body: &str, end: &str) -> Regex {
    Regex::new(&format!(r"(?i){body}([^,.;\n]+?){end}")).expect("valid regex")
}

/// The built-in rule set, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn BioRule>> {
    vec![
        Box::new(FirstMatch::new(
            "birth_place",
            rule_regex(r"\bborn\s+(?:on\s+[^,;\n]+?\s+)?in\s+", r"(?:\s+(?:and|on)\b|[,.;\n]|$)"),
            BioField::BirthPlace,
        )),
        Box::new(FirstMatch::new(
            "ordination_date",
            rule_regex(r"\bordained\s+(?:a\s+)?priest\s+(?:on|in)\s+", DATE_END),
            BioField::OrdinationDate,
        )),
        Box::new(FirstMatch::new(
            "episcopal_consecration_date",
            rule_regex(
                r"\b(?:episcopal\s+consecration|consecrated\s+(?:a\s+)?bishop)\s+(?:on|in)\s+",
                DATE_END,
            ),
            BioField::EpiscopalConsecrationDate,
        )),
        Box::new(FirstMatch::new(
            "elevation_date",
            rule_regex(
                r"\bcreated\s+(?:and\s+proclaimed\s+)?cardinal\s+(?:by\s+[^,.;\n]+?\s+)?(?:on|in)\s+",
                END,
            ),
            BioField::ElevationDate,
        )),
        Box::new(AllMatches::new(
            "education",
            rule_regex(
                r"\b(?:doctorate|licentiate|degree)\s+in\s+",
                r"(?:\s+(?:from|at)\b|[,.;\n]|$)",
            ),
            BioField::Education,
        )),
        Box::new(SplitList::new(
            "languages",
            Regex::new(r"(?i)\b(?:speaks|fluent\s+in)\s+([^.;\n]+)").expect("valid regex"),
            BioField::Languages,
        )),
    ]
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Runs an ordered set of [`BioRule`]s over biography text.
pub struct TextFieldExtractor {
    rules: Vec<Box<dyn BioRule>>,
}

impl TextFieldExtractor {
    /// Extractor with the built-in rule set.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Extractor with no rules; add them with [`Self::with_rule`].
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. Later rules writing the same field win.
    pub fn with_rule(mut self, rule: impl BioRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Apply every rule independently and collect what matched.
    pub fn extract(&self, text: &str) -> StructuredBio {
        let mut bio = StructuredBio::default();
        for rule in &self.rules {
            match rule.apply(text) {
                Some(field) => field.apply_to(&mut bio),
                None => debug!(rule = rule.name(), "no match"),
            }
        }
        bio
    }
}

impl Default for TextFieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> StructuredBio {
        TextFieldExtractor::new().extract(text)
    }

    #[test]
    fn birth_place_and_ordination_only() {
        let bio = extract("He was born in Manila and ordained priest on 27 February 1966.");
        assert_eq!(
            bio,
            StructuredBio {
                birth_place: Some("Manila".into()),
                ordination_date: Some("27 February 1966".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn birth_place_after_date() {
        let bio = extract("Cardinal Tagle was born on 21 June 1957 in Manila, Philippines.");
        assert_eq!(bio.birth_place.as_deref(), Some("Manila"));
    }

    #[test]
    fn birth_place_before_date() {
        let bio = extract("He was born in Imus on 21 June 1957.");
        assert_eq!(bio.birth_place.as_deref(), Some("Imus"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let bio = extract("BORN IN Cebu. Ordained A Priest In 1982.");
        assert_eq!(bio.birth_place.as_deref(), Some("Cebu"));
        assert_eq!(bio.ordination_date.as_deref(), Some("1982"));
    }

    #[test]
    fn consecration_and_elevation() {
        let text = "He received episcopal consecration on 12 December 2001. \
                    He was created and proclaimed Cardinal by Pope Benedict XVI in the consistory of 24 November 2012.";
        let bio = extract(text);
        assert_eq!(bio.episcopal_consecration_date.as_deref(), Some("12 December 2001"));
        assert_eq!(
            bio.elevation_date.as_deref(),
            Some("the consistory of 24 November 2012")
        );
    }

    #[test]
    fn elevation_without_pope() {
        let bio = extract("He was created cardinal on 24 November 2012.");
        assert_eq!(bio.elevation_date.as_deref(), Some("24 November 2012"));
    }

    #[test]
    fn education_collects_all_matches() {
        let text = "He earned a licentiate in Sacred Theology from the Loyola School, \
                    and a doctorate in Theology, later a degree in Philosophy.";
        let bio = extract(text);
        assert_eq!(bio.education, vec!["Sacred Theology", "Theology", "Philosophy"]);
    }

    #[test]
    fn education_keeps_conjoined_subjects() {
        let bio = TextFieldExtractor::new()
            .extract("He obtained a doctorate in Canon Law and Civil Law at the Lateran.");
        assert_eq!(bio.education, vec!["Canon Law and Civil Law"]);
    }

    #[test]
    fn languages_split_on_commas_and_conjunction() {
        let bio = extract("He speaks English, Italian and Tagalog.");
        assert_eq!(bio.languages, vec!["English", "Italian", "Tagalog"]);

        let bio = extract("He is fluent in Spanish and Portuguese; he also reads Latin.");
        assert_eq!(bio.languages, vec!["Spanish", "Portuguese"]);
    }

    #[test]
    fn no_match_leaves_everything_empty() {
        let bio = extract("A pastor known for his humility.");
        assert!(bio.is_empty());
    }

    #[test]
    fn one_rule_missing_does_not_block_others() {
        let bio = extract("Fluent in French. Ordained priest in 1975.");
        assert!(bio.birth_place.is_none());
        assert_eq!(bio.ordination_date.as_deref(), Some("1975"));
        assert_eq!(bio.languages, vec!["French"]);
    }

    #[test]
    fn custom_rule_can_be_added() {
        let extractor = TextFieldExtractor::empty().with_rule(FirstMatch::new(
            "nato_a",
            Regex::new(r"(?i)\bnato\s+a\s+(\w+)").unwrap(),
            BioField::BirthPlace,
        ));
        assert_eq!(extractor.rule_names(), vec!["nato_a"]);
        let bio = extractor.extract("Nato a Roma nel 1950");
        assert_eq!(bio.birth_place.as_deref(), Some("Roma"));
    }

    #[test]
    fn default_rule_order() {
        assert_eq!(
            TextFieldExtractor::new().rule_names(),
            vec![
                "birth_place",
                "ordination_date",
                "episcopal_consecration_date",
                "elevation_date",
                "education",
                "languages",
            ]
        );
    }
}
