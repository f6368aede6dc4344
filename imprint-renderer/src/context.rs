//! Template context — serializable rendering payload built from a [`Manifest`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use imprint_core::Manifest;

use crate::error::RenderError;

/// Directory (relative to the artifact root) holding captured bytes.
pub const PAYLOAD_DIR: &str = "payload";

/// Caller-controlled knobs for synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Cargo package name of the generated program.
    pub package_name: String,
    /// Version requirement for the `imprint-runtime` dependency.
    pub runtime_version: String,
    /// Local `imprint-runtime` checkout; emitted as a `path` dependency.
    pub runtime_path: Option<PathBuf>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            package_name: "imprint-artifact".to_string(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            runtime_path: None,
        }
    }
}

/// Rendering payload handed to Tera.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisContext {
    pub package: PackageCtx,
    pub runtime: RuntimeCtx,
    /// One element per manifest entry, in manifest order.
    pub entries: Vec<EntryCtx>,
    pub meta: MetaCtx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCtx {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeCtx {
    pub version: String,
    /// Quoted TOML string, present only for path dependencies.
    pub path_literal: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCtx {
    pub identifier: String,
    /// Quoted Rust string literal of the relative path.
    pub relative_path_literal: String,
    /// `/`-separated payload path relative to the artifact root.
    pub payload: String,
    pub digest: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub imprint_version: String,
    pub entry_count: usize,
}

impl SynthesisContext {
    /// Build a [`SynthesisContext`] from a manifest.
    pub fn from_manifest(
        manifest: &Manifest,
        options: &SynthesisOptions,
    ) -> Result<Self, RenderError> {
        validate_package_name(&options.package_name)?;

        let entries = manifest
            .iter()
            .map(|entry| EntryCtx {
                identifier: entry.identifier().to_string(),
                relative_path_literal: format!("{:?}", entry.relative_path()),
                payload: payload_path(entry.identifier().as_str()),
                digest: entry.expected_digest().to_hex(),
                size: entry.content().len(),
            })
            .collect::<Vec<_>>();

        Ok(SynthesisContext {
            package: PackageCtx {
                name: options.package_name.clone(),
                version: "0.1.0".to_string(),
            },
            runtime: RuntimeCtx {
                version: options.runtime_version.clone(),
                path_literal: options
                    .runtime_path
                    .as_ref()
                    .map(|p| toml_string(&p.to_string_lossy().replace('\\', "/"))),
            },
            meta: MetaCtx {
                imprint_version: env!("CARGO_PKG_VERSION").to_string(),
                entry_count: entries.len(),
            },
            entries,
        })
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

/// `payload/<identifier>`.
pub fn payload_path(identifier: &str) -> String {
    format!("{PAYLOAD_DIR}/{identifier}")
}

fn validate_package_name(name: &str) -> Result<(), RenderError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RenderError::InvalidPackageName(name.to_string()))
    }
}

/// Quote `value` as a TOML basic string.
fn toml_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
