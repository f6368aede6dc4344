//! Optional per-tree configuration, read from `<root>/imprint.yaml`.
//!
//! ```yaml
//! package: dotfiles-installer
//! exclude:
//!   - notes/private
//!   - scratch.txt
//! runtime:
//!   version: "0.1"
//!   path: ../imprint/imprint-runtime
//! max_concurrency: 16
//! ```
//!
//! Every field is optional. CLI flags take precedence over file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ManifestError};

/// File name looked up at the capture root. Never captured itself.
pub const CONFIG_FILE: &str = "imprint.yaml";

/// Contents of `imprint.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImprintConfig {
    /// Package name of the generated artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Extra relative paths (files or directory prefixes) to leave out.
    pub exclude: Vec<String>,
    /// How the artifact depends on `imprint-runtime`.
    pub runtime: RuntimeDependency,
    /// Upper bound on concurrent reconciliation units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

/// Dependency coordinates for `imprint-runtime` in the generated `Cargo.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeDependency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Local checkout to build against instead of the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// `<root>/imprint.yaml` — pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load the config for the tree at `root`.
///
/// Returns defaults if the file does not exist and
/// [`ManifestError::Config`] (with path) if it is malformed.
pub fn load_at(root: &Path) -> Result<ImprintConfig, ManifestError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(ImprintConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(ImprintConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ManifestError::Config { path, source })
}
