//! Shared pipeline entrypoints used by the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use imprint_core::{ContentDigest, Manifest, ManifestBuilder};
use imprint_renderer::{SynthesisOptions, Synthesizer};

use crate::driver::{reconcile_blocking, ReconcileOptions, ReconcileReport};
use crate::error::{io_err, SyncError};
use crate::writer::{reconcile_file, WriteResult};

/// Options for [`generate`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub synthesis: SynthesisOptions,
    /// Extra relative paths to leave out of the capture.
    pub exclude: Vec<String>,
    /// Directory of `.tera` overrides for the embedded templates.
    pub template_dir: Option<PathBuf>,
    pub dry_run: bool,
}

/// Outcome of [`generate`].
#[derive(Debug)]
pub struct GenerateResult {
    pub out_dir: PathBuf,
    pub entry_count: usize,
    pub writes: Vec<WriteResult>,
}

impl GenerateResult {
    pub fn written(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| !matches!(w, WriteResult::Unchanged { .. }))
            .count()
    }
}

/// Options for [`apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub exclude: Vec<String>,
    pub reconcile: ReconcileOptions,
}

/// Capture the tree at `root`, skipping `exclude` and, if it lies inside
/// the tree, `skip_dir`.
pub fn capture(
    root: &Path,
    exclude: &[String],
    skip_dir: Option<&Path>,
) -> Result<Manifest, SyncError> {
    let root = absolutize(root)?;
    let mut builder = ManifestBuilder::new(&root).exclude_all(exclude.iter().cloned());
    if let Some(dir) = skip_dir {
        builder = builder.exclude_path(&absolutize(dir)?);
    }
    Ok(builder.build()?)
}

/// Capture `root` and materialize a standalone program package in `out`.
///
/// Every artifact file goes through the digest-gated writer, so
/// regenerating from an unchanged tree rewrites nothing.
pub fn generate(
    root: &Path,
    out: &Path,
    options: &GenerateOptions,
) -> Result<GenerateResult, SyncError> {
    let manifest = capture(root, &options.exclude, Some(out))?;
    let synthesizer = match &options.template_dir {
        Some(dir) => Synthesizer::with_template_dir(dir)?,
        None => Synthesizer::new()?,
    };
    let artifact = synthesizer.render(&manifest, &options.synthesis)?;

    let mut writes = Vec::with_capacity(artifact.files.len());
    for file in &artifact.files {
        let path = out.join(&file.relative_path);
        let digest = ContentDigest::of(&file.content);
        writes.push(reconcile_file(&path, &file.content, &digest, options.dry_run)?);
    }

    tracing::info!(
        "generated {} from {} file(s)",
        out.display(),
        manifest.len()
    );
    Ok(GenerateResult {
        out_dir: out.to_path_buf(),
        entry_count: manifest.len(),
        writes,
    })
}

/// Capture `root` and reconcile it straight into `base`, without an
/// intermediate program.
pub fn apply(
    root: &Path,
    base: &Path,
    options: &ApplyOptions,
) -> Result<ReconcileReport, SyncError> {
    let manifest = capture(root, &options.exclude, None)?;
    reconcile_blocking(Arc::new(manifest), base, options.reconcile)
}

fn absolutize(path: &Path) -> Result<PathBuf, SyncError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| io_err(path, e))?;
    Ok(cwd.join(path))
}
