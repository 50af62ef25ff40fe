//! `assetsync plan`: dry-run deploy, rendered or as JSON.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use assetsync_core::{Plan, PlanCounts, Release};
use assetsync_sync::{pipeline, store, LogReporter};

use super::render::{print_legend, print_plan, NO_CHANGES};
use super::SelectionArgs;

/// Arguments for `assetsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    release: Release,
    generated_at: DateTime<Utc>,
    counts: PlanCounts,
    entries: &'a Plan,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let mut cfg = self.selection.resolve()?;
        cfg.dry_run = true;

        let store = store::open(&cfg.bucket)
            .with_context(|| format!("failed to open bucket '{}'", cfg.bucket))?;
        let plan = pipeline::plan(&cfg, store.as_ref(), &LogReporter)
            .context("failed to build deploy plan")?;

        if self.json {
            let payload = PlanJson {
                release: cfg.release,
                generated_at: Utc::now(),
                counts: plan.counts(),
                entries: &plan,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize plan JSON")?
            );
            return Ok(());
        }

        if !plan.has_changes() {
            println!("{NO_CHANGES}");
            return Ok(());
        }
        print_legend();
        print_plan(&plan);
        Ok(())
    }
}
