//! Batch checkpoints and the final roster file.
//!
//! Checkpoints are written as `progress_{YYYYmmdd_HHMMSS}_{count:05}.json`
//! (plus a `_{n:03}` suffix when that name is taken) and are never deleted
//! or replaced, so earlier snapshots stay available for recovery.
//! The lexicographically greatest file name is the latest checkpoint.

use std::path::{Path, PathBuf};

use chrono::Utc;
use roster_shared::{BatchSnapshot, EntityRecord, Result, RosterError};
use serde::Serialize;
use tracing::{debug, info, warn};

const CHECKPOINT_PREFIX: &str = "progress_";
const ROSTER_PREFIX: &str = "roster_enriched_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Durable home for in-progress batch snapshots.
pub trait CheckpointStore: Send + Sync {
    /// Persist a snapshot. A failure here is fatal to the batch.
    fn write(&self, snapshot: &BatchSnapshot) -> Result<()>;

    /// The most recent snapshot, if any exists.
    fn read_latest(&self) -> Result<Option<BatchSnapshot>>;
}

/// Checkpoints as pretty-printed JSON files in one directory.
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Checkpoint files, oldest first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RosterError::persistence(&self.dir, e.to_string())),
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(CHECKPOINT_PREFIX) && n.ends_with(".json"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// `{stem}.json`, or `{stem}_{n:03}.json` when an earlier write in the
    /// same second had the same record count. Both sort after the plain name.
    fn free_name(&self, stem: &str) -> String {
        let plain = format!("{stem}.json");
        if !self.dir.join(&plain).exists() {
            return plain;
        }
        (1u32..)
            .map(|n| format!("{stem}_{n:03}.json"))
            .find(|name| !self.dir.join(name).exists())
            .unwrap_or(plain)
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn write(&self, snapshot: &BatchSnapshot) -> Result<()> {
        let stem = format!(
            "{CHECKPOINT_PREFIX}{}_{:05}",
            Utc::now().format(TIMESTAMP_FORMAT),
            snapshot.records.len()
        );
        let path = write_json(&self.dir, &self.free_name(&stem), snapshot)?;
        info!(
            path = %path.display(),
            records = snapshot.records.len(),
            complete = snapshot.complete,
            "checkpoint written"
        );
        Ok(())
    }

    /// Newest readable checkpoint. An unreadable file is skipped in favour of
    /// the one before it.
    fn read_latest(&self) -> Result<Option<BatchSnapshot>> {
        for path in self.list()?.iter().rev() {
            let parsed = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<BatchSnapshot>(&s).map_err(|e| e.to_string()));
            match parsed {
                Ok(snapshot) => {
                    debug!(path = %path.display(), "loaded checkpoint");
                    return Ok(Some(snapshot));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable checkpoint"),
            }
        }
        Ok(None)
    }
}

/// Write the final roster as a JSON array into `dir`. Returns the file path.
pub fn write_roster(dir: &Path, records: &[EntityRecord]) -> Result<PathBuf> {
    let name = format!("{ROSTER_PREFIX}{}.json", Utc::now().format(TIMESTAMP_FORMAT));
    let path = write_json(dir, &name, records)?;
    info!(path = %path.display(), records = records.len(), "roster written");
    Ok(path)
}

/// Serialize to `<dir>/<name>` through a temporary file and rename.
fn write_json<T: Serialize + ?Sized>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| RosterError::persistence(dir, e.to_string()))?;

    let path = dir.join(name);
    let tmp = dir.join(format!(".{name}.tmp"));
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| RosterError::persistence(&path, e.to_string()))?;

    std::fs::write(&tmp, json).map_err(|e| RosterError::persistence(&tmp, e.to_string()))?;
    std::fs::rename(&tmp, &path).map_err(|e| RosterError::persistence(&path, e.to_string()))?;
    Ok(path)
}
