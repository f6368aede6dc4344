//! Error types for imprint-sync.

use std::path::PathBuf;

use thiserror::Error;

use imprint_core::ManifestError;
use imprint_renderer::RenderError;

/// All errors that can arise from reconciliation and generation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be built or decoded.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// An error from the program synthesizer.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// A reconciliation task panicked or was cancelled.
    #[error("reconciliation task for '{identifier}' did not complete: {message}")]
    TaskJoin { identifier: String, message: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
