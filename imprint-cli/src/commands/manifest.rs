//! `imprint manifest` — list what a capture of the tree would contain.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use imprint_core::Manifest;
use imprint_sync::pipeline;

use super::{load_config, resolve_root};

/// Arguments for `imprint manifest`.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Directory to capture (defaults to the current directory).
    pub root: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct EntryJson {
    identifier: String,
    relative_path: String,
    size: usize,
    digest: String,
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "identifier")]
    identifier: String,
    #[tabled(rename = "path")]
    relative_path: String,
    #[tabled(rename = "size")]
    size: usize,
    #[tabled(rename = "sha256")]
    digest: String,
}

impl ManifestArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(self.root);
        let cfg = load_config(&root)?;
        let manifest = pipeline::capture(&root, &cfg.exclude, None)
            .with_context(|| format!("failed to capture {}", root.display()))?;

        if self.json {
            print_json(&manifest)
        } else {
            print_table(&manifest, &root);
            Ok(())
        }
    }
}

fn print_json(manifest: &Manifest) -> Result<()> {
    let payload: Vec<EntryJson> = manifest
        .iter()
        .map(|entry| EntryJson {
            identifier: entry.identifier().to_string(),
            relative_path: entry.relative_path().to_string(),
            size: entry.content().len(),
            digest: entry.expected_digest().to_hex(),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize manifest JSON")?
    );
    Ok(())
}

fn print_table(manifest: &Manifest, root: &std::path::Path) {
    println!(
        "Imprint v{} | {} file(s) from {}",
        env!("CARGO_PKG_VERSION"),
        manifest.len(),
        root.display()
    );
    if manifest.is_empty() {
        println!("No files captured.");
        return;
    }

    let rows: Vec<EntryRow> = manifest
        .iter()
        .map(|entry| EntryRow {
            identifier: entry.identifier().to_string(),
            relative_path: entry.relative_path().to_string(),
            size: entry.content().len(),
            digest: short_digest(&entry.expected_digest().to_hex()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let total: usize = manifest.iter().map(|e| e.content().len()).sum();
    println!("{}", format!("{total} bytes total").bright_black());
}

fn short_digest(hex: &str) -> String {
    hex.chars().take(12).collect()
}
