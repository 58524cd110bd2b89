//! Raw document archive for offline inspection of extraction failures.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use url::Url;

use roster_shared::{Result, RosterError};

/// Persists raw fetched documents keyed by their reference.
///
/// Archiving is a debugging aid: failures are logged and never surfaced.
pub trait DebugArchive: Send + Sync {
    fn store(&self, reference: &Url, body: &str);
}

/// Writes each document to `<dir>/<sha256(reference)>.html`.
pub struct FsDebugArchive {
    dir: PathBuf,
}

impl FsDebugArchive {
    /// Open (and create if needed) the archive directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| RosterError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Archive file path for a reference.
    pub fn path_for(&self, reference: &Url) -> PathBuf {
        self.dir.join(format!("{}.html", reference_hash(reference)))
    }
}

impl DebugArchive for FsDebugArchive {
    fn store(&self, reference: &Url, body: &str) {
        let path = self.path_for(reference);
        match std::fs::write(&path, body) {
            Ok(()) => debug!(%reference, ?path, "archived document"),
            Err(e) => warn!(%reference, ?path, error = %e, "failed to archive document"),
        }
    }
}

/// SHA-256 of the reference string, hex encoded.
fn reference_hash(reference: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}
