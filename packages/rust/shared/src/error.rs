//! Error types for the roster tools.
//!
//! Library crates use [`RosterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only [`RosterError::Persistence`] and [`RosterError::Input`] are meant to
//! reach a batch caller; transport failures are downgraded to absence at the
//! entity boundary.

use std::path::PathBuf;

/// A failed network interaction: connection error, timeout, or non-success status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport error for {reference}: {message}")]
pub struct TransportError {
    /// The URL or query the failure belongs to.
    pub reference: String,
    /// What went wrong.
    pub message: String,
}

impl TransportError {
    pub fn new(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Top-level error type for all roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// Network failure that exhausted its retry budget.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Checkpoint or final output could not be written. Fatal to a batch.
    #[error("persistence error at {path:?}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Seed roster could not be read. Fatal; the batch cannot start.
    #[error("input error: {message}")]
    Input { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error outside of checkpoint/output writes.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RosterError>;

impl RosterError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an input error from any displayable message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    /// Create a persistence error for the given path.
    pub fn persistence(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort a running batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Input { .. })
    }
}
