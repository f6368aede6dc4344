//! # imprint-renderer
//!
//! Tera-based synthesizer that turns a captured [`imprint_core::Manifest`]
//! into the sources of a standalone reconciliation program.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use imprint_core::manifest::build_at;
//! use imprint_renderer::{SynthesisOptions, Synthesizer};
//!
//! fn synthesize(root: &std::path::Path) {
//!     let Ok(manifest) = build_at(root) else { return };
//!     if let Ok(synthesizer) = Synthesizer::new() {
//!         if let Ok(artifact) = synthesizer.render(&manifest, &SynthesisOptions::default()) {
//!             for file in &artifact.files {
//!                 println!("{}: {} bytes", file.relative_path.display(), file.content.len());
//!             }
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{payload_path, SynthesisContext, SynthesisOptions, PAYLOAD_DIR};
pub use engine::{Artifact, ArtifactFile, ArtifactOutput, Synthesizer, TemplateEngine};
pub use error::RenderError;
