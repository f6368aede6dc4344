//! `imprint apply` — reconcile a tree straight into a base directory.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use imprint_sync::{
    pipeline::{self, ApplyOptions},
    ReconcileOptions, ReconcileReport, WriteResult,
};

use super::{load_config, resolve_root};

/// Arguments for `imprint apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Directory to capture (defaults to the current directory).
    pub root: Option<PathBuf>,

    /// Destination root; each file lands at `<base>/.<relative path>`.
    #[arg(long)]
    pub base: PathBuf,

    /// Show what would be written without actually writing any files.
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of files reconciled at once.
    #[arg(long)]
    pub jobs: Option<usize>,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(self.root);
        let cfg = load_config(&root)?;
        let options = ApplyOptions {
            exclude: cfg.exclude,
            reconcile: ReconcileOptions {
                dry_run: self.dry_run,
                max_concurrency: self.jobs.or(cfg.max_concurrency),
            },
        };

        let report = pipeline::apply(&root, &self.base, &options)
            .with_context(|| format!("apply failed for {}", root.display()))?;
        print_report(&report, self.dry_run);

        let failed = report.failures().count();
        if failed > 0 {
            bail!("{failed} of {} file(s) failed to reconcile", report.len());
        }
        Ok(())
    }
}

fn print_report(report: &ReconcileReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if report.is_empty() {
        println!("{prefix}✓ nothing to do");
        return;
    }

    let changed = if dry_run {
        report.would_write()
    } else {
        report.written()
    };
    println!(
        "{prefix}✓ reconciled {} file(s) ({} written, {} unchanged)",
        report.len(),
        changed,
        report.unchanged()
    );

    for entry in &report.entries {
        match &entry.result {
            Ok(WriteResult::Written { path }) => println!("  ✎  {}", path.display()),
            Ok(WriteResult::WouldWrite { path }) => println!("  ~  {}", path.display()),
            Ok(WriteResult::Unchanged { path }) => println!("  ·  {}", path.display()),
            Err(err) => eprintln!(
                "  {}  {}: {err}",
                "✗".red().bold(),
                entry.destination.display()
            ),
        }
    }
}
