//! `imprint generate` — synthesize the standalone program package.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use imprint_renderer::SynthesisOptions;
use imprint_sync::{
    pipeline::{self, GenerateOptions},
    WriteResult,
};

use super::{absolute_from, load_config, resolve_root};

/// Arguments for `imprint generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory to capture (defaults to the current directory).
    pub root: Option<PathBuf>,

    /// Directory to write the program package into.
    #[arg(long)]
    pub out: PathBuf,

    /// Cargo package name of the generated program.
    #[arg(long)]
    pub package: Option<String>,

    /// Version requirement for the imprint-runtime dependency.
    #[arg(long)]
    pub runtime_version: Option<String>,

    /// Build against a local imprint-runtime checkout.
    #[arg(long)]
    pub runtime_path: Option<PathBuf>,

    /// Directory of `.tera` files overriding the built-in templates.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(self.root);
        let cfg = load_config(&root)?;

        let defaults = SynthesisOptions::default();
        let runtime_path = match (self.runtime_path, cfg.runtime.path) {
            (Some(flag), _) => Some(absolute_from(&std::env::current_dir()?, &flag)?),
            (None, Some(file)) => Some(absolute_from(&root, &file)?),
            (None, None) => None,
        };
        let options = GenerateOptions {
            synthesis: SynthesisOptions {
                package_name: self
                    .package
                    .or(cfg.package)
                    .unwrap_or(defaults.package_name),
                runtime_version: self
                    .runtime_version
                    .or(cfg.runtime.version)
                    .unwrap_or(defaults.runtime_version),
                runtime_path,
            },
            exclude: cfg.exclude,
            template_dir: self.templates,
            dry_run: self.dry_run,
        };

        let result = pipeline::generate(&root, &self.out, &options)
            .with_context(|| format!("generate failed for {}", root.display()))?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        println!(
            "{prefix}✓ generated '{}' from {} file(s) ({} written, {} unchanged)",
            options.synthesis.package_name,
            result.entry_count,
            result.written(),
            result.writes.len() - result.written(),
        );
        for w in &result.writes {
            match w {
                WriteResult::Written { path } => println!("  ✎  {}", path.display()),
                WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
                WriteResult::Unchanged { .. } => {}
            }
        }
        if !self.dry_run {
            println!(
                "Build it with: cargo build --release --manifest-path {}",
                result.out_dir.join("Cargo.toml").display()
            );
            if options.synthesis.runtime_path.is_none() {
                eprintln!(
                    "{} the package depends on imprint-runtime {} from crates.io; \
                     pass --runtime-path (or set runtime.path in imprint.yaml) \
                     to build against a local checkout",
                    "note:".yellow(),
                    options.synthesis.runtime_version,
                );
            }
        }
        Ok(())
    }
}
