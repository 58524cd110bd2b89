//! Search variants from a raw, possibly decorated roster name.
//!
//! `"Card. LUIS ANTONIO G. TAGLE, S.I."` becomes
//! `full = "Luis Antonio G. Tagle"`, `simple = "Luis Tagle"`,
//! `distinctive = "Tagle"`.

use std::sync::LazyLock;

use regex::Regex;

/// Honorifics and titles that may lead a name, any number of times.
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:his\s+eminence|card\.|cardinal|mons\.|msgr\.|archbishop|abp\.|bishop|bp\.|rev\.|fr\.)(?:\s+|$)",
    )
    .expect("valid regex")
});

/// Trailing religious-order abbreviation: a comma and one to three dotted tokens
/// (`, S.I.`, `, O.F.M. Cap.`).
static ORDER_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r",\s*\p{L}+\.(?:\p{L}+\.)*(?:\s+\p{L}+\.(?:\p{L}+\.)*){0,2}\s*$")
        .expect("valid regex")
});

/// The three search forms of one name, most specific first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameVariants {
    pub full: String,
    /// First and last token.
    pub simple: String,
    /// Last token.
    pub distinctive: String,
}

impl NameVariants {
    /// Distinct variants in cascade order.
    pub fn to_vec(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(3);
        for v in [&self.full, &self.simple, &self.distinctive] {
            if !out.contains(v) {
                out.push(v.clone());
            }
        }
        out
    }
}

/// Derive search variants from a raw name. Pure and total.
pub fn normalize(raw: &str) -> NameVariants {
    let mut name = raw.replace('_', " ").trim().to_string();

    while let Some(m) = PREFIX_RE.find(&name) {
        name = name[m.end()..].trim_start().to_string();
    }

    let name = ORDER_SUFFIX_RE.replace(&name, "");

    let tokens: Vec<String> = name
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
        .map(recase)
        .collect();

    let full = tokens.join(" ");
    let simple = match tokens.as_slice() {
        [first, .., last] => format!("{first} {last}"),
        _ => full.clone(),
    };
    let distinctive = tokens.last().cloned().unwrap_or_else(|| full.clone());

    NameVariants {
        full,
        simple,
        distinctive,
    }
}

/// Title-case a token written entirely in capitals; leave anything else alone.
fn recase(token: &str) -> String {
    let has_upper = token.chars().any(char::is_uppercase);
    let has_lower = token.chars().any(char::is_lowercase);
    if !has_upper || has_lower || token.chars().count() < 2 {
        return token.to_string();
    }

    let mut out = String::with_capacity(token.len());
    let mut in_word = false;
    for c in token.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
