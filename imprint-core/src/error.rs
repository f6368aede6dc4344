//! Error types for imprint-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building or validating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure, annotated with the path being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed (permission denied, vanished entry, loop).
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A captured path cannot be represented as UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    /// The normalized identifier is not a usable symbol.
    #[error("path '{path}' normalizes to invalid identifier '{identifier}'")]
    InvalidIdentifier { path: String, identifier: String },

    /// Two captured paths normalize to the same identifier.
    #[error("identifier '{identifier}' is produced by both '{first}' and '{second}'")]
    IdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },

    /// Two entries would reconcile into the same destination.
    #[error("destination '{destination}' is claimed by more than one entry")]
    DuplicateDestination { destination: String },

    /// An embedded digest is not 64 hex characters.
    #[error("invalid digest for '{identifier}': {reason}")]
    InvalidDigest { identifier: String, reason: String },

    /// Content no longer hashes to its recorded digest.
    #[error("content of '{identifier}' does not match its expected digest")]
    DigestMismatch { identifier: String },

    /// `imprint.yaml` exists but could not be parsed.
    #[error("failed to parse config at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Convenience constructor for [`ManifestError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}
