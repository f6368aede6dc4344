//! Imprint — capture a directory tree into a self-installing program.
//!
//! # Usage
//!
//! ```text
//! imprint manifest [ROOT] [--json]
//! imprint generate [ROOT] --out <dir> [--package <name>] [--runtime-path <path>] [--dry-run]
//! imprint apply [ROOT] --base <dir> [--dry-run] [--jobs <n>]
//! imprint diff [ROOT] --base <dir>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::ApplyArgs, diff::DiffArgs, generate::GenerateArgs, manifest::ManifestArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "imprint",
    version,
    about = "Capture a directory tree and reproduce it anywhere with digest-gated writes",
    long_about = None,
)]
struct Cli {
    /// Log progress (equivalent to RUST_LOG=info).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the files that would be captured from a tree.
    Manifest(ManifestArgs),

    /// Synthesize a standalone program that embeds the tree.
    Generate(GenerateArgs),

    /// Reconcile a tree straight into a base directory.
    Apply(ApplyArgs),

    /// Show unified diffs of what apply would change.
    Diff(DiffArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Manifest(args) => args.run(),
        Commands::Generate(args) => args.run(),
        Commands::Apply(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
