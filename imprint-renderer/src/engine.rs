//! Tera rendering engine — [`ArtifactFile`] enum and [`Synthesizer`].
//!
//! # Artifact layout
//!
//! | File                   | Source                                   |
//! |------------------------|------------------------------------------|
//! | `Cargo.toml`           | `artifact/cargo.toml.tera`               |
//! | `src/main.rs`          | `artifact/main.rs.tera`                  |
//! | `payload/<identifier>` | captured bytes, copied verbatim          |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use imprint_core::Manifest;

use crate::context::{payload_path, SynthesisContext, SynthesisOptions};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates — baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("artifact/cargo.toml.tera", include_str!("templates/cargo.toml.tera")),
    ("artifact/main.rs.tera", include_str!("templates/main.rs.tera")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), RenderError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path
            .strip_prefix(dir)
            .unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert(
            normalize_template_name(Path::new(name)),
            (*content).to_string(),
        );
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ArtifactFile
// ---------------------------------------------------------------------------

/// Rendered (non-payload) files of a generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFile {
    CargoManifest,
    MainSource,
}

impl ArtifactFile {
    /// All rendered files in a stable order.
    pub fn all() -> &'static [ArtifactFile] {
        &[ArtifactFile::CargoManifest, ArtifactFile::MainSource]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            ArtifactFile::CargoManifest => "artifact/cargo.toml.tera",
            ArtifactFile::MainSource    => "artifact/main.rs.tera",
        }
    }

    /// Output path relative to the artifact root.
    pub fn output_path(&self) -> PathBuf {
        match self {
            ArtifactFile::CargoManifest => PathBuf::from("Cargo.toml"),
            ArtifactFile::MainSource    => Path::new("src").join("main.rs"),
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// One file of a synthesized artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutput {
    /// Path relative to the artifact root.
    pub relative_path: PathBuf,
    pub content: Vec<u8>,
}

/// Everything needed to materialize a standalone program on disk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Artifact {
    pub files: Vec<ArtifactOutput>,
}

impl Artifact {
    /// Look up a file by its path relative to the artifact root.
    pub fn get(&self, relative_path: impl AsRef<Path>) -> Option<&ArtifactOutput> {
        let wanted = relative_path.as_ref();
        self.files.iter().find(|f| f.relative_path == wanted)
    }
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine for rendering templates with optional user overrides.
///
/// `user_template_dir` may contain `.tera` files that override embedded
/// defaults, e.g. `<dir>/artifact/main.rs.tera`.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    pub fn render(
        &self,
        ctx: &SynthesisContext,
        file: ArtifactFile,
    ) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(file.template_name(), &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Turns a [`Manifest`] into an [`Artifact`]. Create once and reuse.
///
/// Rendering is deterministic: the same manifest and options always produce
/// byte-identical output.
pub struct Synthesizer {
    engine: TemplateEngine,
}

impl Synthesizer {
    /// Construct a [`Synthesizer`] with embedded templates.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Synthesizer { engine: TemplateEngine::new(None)? })
    }

    /// Construct a [`Synthesizer`] whose templates may be overridden from `dir`.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(Synthesizer { engine: TemplateEngine::new(Some(dir))? })
    }

    /// Render the program sources and collect payload copies.
    pub fn render(
        &self,
        manifest: &Manifest,
        options: &SynthesisOptions,
    ) -> Result<Artifact, RenderError> {
        let ctx = SynthesisContext::from_manifest(manifest, options)?;

        let mut files = Vec::with_capacity(ArtifactFile::all().len() + manifest.len());
        for file in ArtifactFile::all() {
            let content = self.engine.render(&ctx, *file)?;
            files.push(ArtifactOutput {
                relative_path: file.output_path(),
                content: content.into_bytes(),
            });
        }
        for entry in manifest {
            let payload = payload_path(entry.identifier().as_str());
            files.push(ArtifactOutput {
                relative_path: payload.split('/').collect(),
                content: entry.content().to_vec(),
            });
        }
        Ok(Artifact { files })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
