//! Seed roster input.

use std::path::{Path, PathBuf};

use roster_shared::{CoreFields, Result, RosterError, SeedEntity};
use serde::Deserialize;
use tracing::{info, warn};

/// Ordered source of seed entities.
pub trait RosterSource {
    fn seeds(&self) -> Result<Vec<SeedEntity>>;
}

/// Reads a JSON array of seeds from disk.
pub struct JsonRosterSource {
    path: PathBuf,
}

impl JsonRosterSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterSource for JsonRosterSource {
    fn seeds(&self) -> Result<Vec<SeedEntity>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            RosterError::input(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let seeds = parse_seeds(&content)?;
        info!(path = %self.path.display(), count = seeds.len(), "loaded roster");
        Ok(seeds)
    }
}

/// One entry as written by the roster listing. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawSeed {
    name: String,
    #[serde(default, alias = "birthDate")]
    birth_date: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default, alias = "appointingAuthority")]
    appointing_pope: Option<String>,
    #[serde(default, alias = "biographyUrl")]
    biography_url: Option<String>,
    #[serde(default, alias = "biographyText")]
    biography_text: Option<String>,
}

impl From<RawSeed> for SeedEntity {
    fn from(raw: RawSeed) -> Self {
        Self {
            name: raw.name.trim().to_string(),
            core_fields: CoreFields {
                birth_date: present(raw.birth_date),
                country: present(raw.country),
                appointing_authority: present(raw.appointing_pope),
            },
            biography_url: present(raw.biography_url),
            biography_text: present(raw.biography_text),
        }
    }
}

/// Blank strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a JSON seed array. A blank name is an input error.
pub fn parse_seeds(json: &str) -> Result<Vec<SeedEntity>> {
    let raw: Vec<RawSeed> = serde_json::from_str(json)
        .map_err(|e| RosterError::input(format!("invalid roster JSON: {e}")))?;

    let mut seeds = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        let seed = SeedEntity::from(entry);
        if seed.name.is_empty() {
            return Err(RosterError::input(format!("roster entry {index} has no name")));
        }
        if seeds.iter().any(|s: &SeedEntity| s.name == seed.name) {
            warn!(name = %seed.name, "duplicate roster name");
        }
        seeds.push(seed);
    }
    Ok(seeds)
}
