//! assetsync: deploy a static asset tree to a bucket with release-based
//! retention.
//!
//! # Usage
//!
//! ```text
//! assetsync deploy --bucket <locator> [--source DIR] [--release N] [--keep N]
//!                  [--dry-run] [--force] [--no-clean] [--no-deploy] [--yes]
//! assetsync plan   --bucket <locator> [--source DIR] [--release N] [--json]
//! ```
//!
//! Every selection flag can also come from `assetsync.yaml` (or `--config`),
//! and `--release` defaults to `$BUILD_NUMBER`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{deploy::DeployArgs, plan::PlanArgs, SelectionArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "assetsync",
    version,
    about = "Deploy static assets to a bucket, keeping the last N releases",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the bucket with the source tree and apply the plan.
    Deploy(DeployArgs),

    /// Show what a deploy would do without touching the bucket.
    Plan(PlanArgs),
}

impl Commands {
    fn selection(&self) -> &SelectionArgs {
        match self {
            Commands::Deploy(args) => &args.selection,
            Commands::Plan(args) => &args.selection,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let selection = cli.command.selection();
    init_tracing(selection.quiet, selection.debug);

    match cli.command {
        Commands::Deploy(args) => args.run(),
        Commands::Plan(args) => args.run(),
    }
}

/// `RUST_LOG` wins; otherwise `info`, lowered by `--quiet`, raised by `--debug`.
fn init_tracing(quiet: bool, debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
