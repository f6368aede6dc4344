//! `imprint diff` — show unified diffs for what apply would write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use imprint_sync::{diff_manifest, pipeline};

use super::{load_config, resolve_root};

/// Arguments for `imprint diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Directory to capture (defaults to the current directory).
    pub root: Option<PathBuf>,

    /// Destination root to compare against.
    #[arg(long)]
    pub base: PathBuf,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let root = resolve_root(self.root);
        let cfg = load_config(&root)?;
        let manifest = pipeline::capture(&root, &cfg.exclude, None)
            .with_context(|| format!("failed to capture {}", root.display()))?;

        let diffs = diff_manifest(&manifest, &self.base)
            .with_context(|| format!("diff failed against {}", self.base.display()))?;

        if diffs.is_empty() {
            println!("No differences in {}.", self.base.display());
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        Ok(())
    }
}
