//! Manifest builder — walks a source tree and captures every regular file.
//!
//! # Exclusions
//!
//! | Rule                         | Applies to                                  |
//! |------------------------------|---------------------------------------------|
//! | version-control metadata     | any directory named `.git`, at any depth    |
//! | self-referential artifacts   | top-level `Cargo.toml`, `Cargo.lock`,       |
//! |                              | `src/main.rs`, `target/`, `imprint.yaml`    |
//! | caller exclusions            | exact relative path or directory prefix     |
//!
//! Traversal is depth-first in file-name order, so the same tree always
//! yields the same manifest. Any error aborts the build; partial manifests
//! are never returned.

use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::CONFIG_FILE;
use crate::error::{io_err, ManifestError};
use crate::types::{Manifest, ManifestEntry};

const VCS_DIRS: &[&str] = &[".git"];

/// Files a generated artifact would write into the tree when built in place.
const SELF_REFERENTIAL: &[&str] = &["Cargo.toml", "Cargo.lock", "src/main.rs", CONFIG_FILE];

const BUILD_OUTPUT_DIR: &str = "target";

/// Builds a [`Manifest`] from the directory tree at `root`.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    root: PathBuf,
    exclusions: Vec<String>,
}

impl ManifestBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Skip a `/`-separated relative path, or everything below it.
    pub fn exclude(mut self, relative: impl Into<String>) -> Self {
        let relative = relative.into().replace('\\', "/");
        let trimmed = relative.trim_matches('/');
        if !trimmed.is_empty() {
            self.exclusions.push(trimmed.to_owned());
        }
        self
    }

    /// Skip `path` if it lies under the root. Paths outside the root are
    /// ignored.
    pub fn exclude_path(self, path: &Path) -> Self {
        let relative = match path.strip_prefix(&self.root) {
            Ok(rel) => match relative_string(rel) {
                Some(rel) => rel,
                None => return self,
            },
            Err(_) => return self,
        };
        self.exclude(relative)
    }

    pub fn exclude_all<I, S>(mut self, relatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for relative in relatives {
            self = self.exclude(relative);
        }
        self
    }

    /// Walk the tree and capture every eligible file.
    pub fn build(&self) -> Result<Manifest, ManifestError> {
        let mut manifest = Manifest::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.prunes(entry));

        for entry in walker {
            let entry = entry.map_err(|source| ManifestError::Walk {
                root: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative_of(entry.path())?;
            if self.is_excluded_file(&relative) {
                tracing::debug!("excluded: {relative}");
                continue;
            }

            let content = std::fs::read(entry.path()).map_err(|e| io_err(entry.path(), e))?;
            tracing::debug!("captured: {relative} ({} bytes)", content.len());
            manifest.push(ManifestEntry::new(relative, content)?)?;
        }

        tracing::info!(
            "built manifest of {} file(s) from {}",
            manifest.len(),
            self.root.display()
        );
        Ok(manifest)
    }

    /// Directories that are never descended into.
    fn prunes(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if VCS_DIRS.iter().any(|dir| *dir == name) {
            return true;
        }
        let Ok(relative) = self.relative_of(entry.path()) else {
            return false;
        };
        relative == BUILD_OUTPUT_DIR || self.matches_exclusion(&relative)
    }

    fn is_excluded_file(&self, relative: &str) -> bool {
        SELF_REFERENTIAL.contains(&relative) || self.matches_exclusion(relative)
    }

    fn matches_exclusion(&self, relative: &str) -> bool {
        self.exclusions.iter().any(|ex| {
            relative == ex
                || relative
                    .strip_prefix(ex.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn relative_of(&self, path: &Path) -> Result<String, ManifestError> {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        relative_string(rel).ok_or_else(|| ManifestError::NonUtf8Path {
            path: path.to_path_buf(),
        })
    }
}

/// Join normal components with `/`. `None` if any component is not UTF-8.
fn relative_string(rel: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}

/// Capture the tree at `root` with default exclusions only.
pub fn build_at(root: &Path) -> Result<Manifest, ManifestError> {
    ManifestBuilder::new(root).build()
}
