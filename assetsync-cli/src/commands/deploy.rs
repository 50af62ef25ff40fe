//! `assetsync deploy`: plan, confirm, execute.

use anyhow::{bail, Context, Result};
use clap::Args;

use assetsync_sync::{execute, pipeline, store, Decision, LogReporter};

use super::render::{confirm, print_legend, print_plan, print_summary, NO_CHANGES};
use super::SelectionArgs;

/// Arguments for `assetsync deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the plan and stop before touching the bucket.
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Execute without asking for confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl DeployArgs {
    pub fn run(self) -> Result<()> {
        let mut cfg = self.selection.resolve()?;
        cfg.dry_run = self.dry_run;
        cfg.yes = self.yes;

        let store = store::open(&cfg.bucket)
            .with_context(|| format!("failed to open bucket '{}'", cfg.bucket))?;
        let reporter = LogReporter;

        let plan = pipeline::plan(&cfg, store.as_ref(), &reporter)
            .context("failed to build deploy plan")?;

        // `--quiet --yes` prints nothing but the execution summary.
        let show_plan = !(cfg.quiet && cfg.yes);

        let decision = pipeline::decide(&cfg, &plan);
        if decision == Decision::NoChanges {
            if show_plan {
                println!("{NO_CHANGES}");
            }
            return Ok(());
        }

        if show_plan {
            print_legend();
            print_plan(&plan);
        }

        if decision == Decision::Preview {
            println!("[dry-run] nothing was changed");
            return Ok(());
        }

        if !cfg.yes && !confirm()? {
            println!("Aborted.");
            return Ok(());
        }

        let report = execute(&cfg, store.as_ref(), &plan, &reporter);
        print_summary(&report);

        if !report.is_success() {
            bail!(
                "{} of {} actions failed",
                report.failure_count(),
                report.outcomes.len()
            );
        }
        Ok(())
    }
}
