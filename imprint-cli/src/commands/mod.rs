pub mod apply;
pub mod diff;
pub mod generate;
pub mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use imprint_core::{config, ImprintConfig};

/// Capture root: the positional argument, or the current directory.
pub(crate) fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| PathBuf::from("."))
}

/// Load `imprint.yaml` from `root`, or defaults.
pub(crate) fn load_config(root: &Path) -> Result<ImprintConfig> {
    config::load_at(root)
        .with_context(|| format!("failed to load {}", config::config_path_at(root).display()))
}

/// `path` made absolute against `relative_to`.
pub(crate) fn absolute_from(relative_to: &Path, path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let anchor = if relative_to.is_absolute() {
        relative_to.to_path_buf()
    } else {
        std::env::current_dir()
            .context("could not determine current directory")?
            .join(relative_to)
    };
    Ok(anchor.join(path))
}
