//! Error types for imprint-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while synthesizing an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// Cargo would reject the requested package name.
    #[error("invalid package name '{0}': use ASCII letters, digits, '-' or '_', starting with a letter")]
    InvalidPackageName(String),
}
