//! One deploy run, end to end: scan, snapshot, reconcile, decide, execute.
//!
//! The CLI drives these steps one at a time so it can render the plan and
//! prompt between them; [`run`] chains them for callers that do not.

use std::path::{Path, PathBuf};

use assetsync_core::config::expand_home;
use assetsync_core::{DeployConfig, KeepReason, LocalInventory, Plan, PlanEntry};

use crate::error::SyncError;
use crate::executor::{execute, ExecutionReport};
use crate::inventory;
use crate::reconcile::reconcile;
use crate::report::Reporter;
use crate::store::ObjectStore;

/// What to do with a computed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to upload, update or delete. The run stops here.
    NoChanges,
    /// Dry-run: show the plan, touch nothing.
    Preview,
    /// Go ahead (after confirmation, if the caller asks for one).
    Execute,
}

/// Scan the source tree, snapshot the bucket and reconcile the two.
///
/// The config file is never part of the local inventory. Keys whose `head`
/// failed are kept as they are. Every drift in the plan is handed to
/// `reporter` in key order.
pub fn plan<S: ObjectStore + ?Sized>(
    config: &DeployConfig,
    store: &S,
    reporter: &dyn Reporter,
) -> Result<Plan, SyncError> {
    config.validate()?;

    let source = expand_home(&config.source)?;
    reporter.phase(&format!("Scanning {}...", source.display()));
    let mut local = assetsync_scan::scan(&source, &config.pattern)?;
    if let Some(config_file) = &config.config_file {
        exclude_file(&mut local, config_file);
    }

    let remote = inventory::fetch(store, reporter)?;

    let mut plan = reconcile(&local, &remote.objects, config);
    for key in remote.unreadable {
        plan.entries.insert(
            key,
            PlanEntry::Keep {
                reason: KeepReason::Unreadable,
            },
        );
    }
    for (key, entry) in plan.iter() {
        if let PlanEntry::UpdateMetadata { drift, .. } = entry {
            for d in drift {
                reporter.drift(key, d);
            }
        }
    }
    Ok(plan)
}

fn exclude_file(local: &mut LocalInventory, path: &Path) {
    let target = canonical(path);
    local.retain(|key, file| {
        let keep = canonical(&file.path) != target;
        if !keep {
            tracing::debug!("{key}: config file, not published");
        }
        keep
    });
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

pub fn decide(config: &DeployConfig, plan: &Plan) -> Decision {
    if !plan.has_changes() {
        Decision::NoChanges
    } else if config.dry_run {
        Decision::Preview
    } else {
        Decision::Execute
    }
}

/// Plan and, unless the decision says otherwise, execute without prompting.
///
/// Returns the plan, the decision and the execution report (empty unless
/// the decision was [`Decision::Execute`]).
pub fn run<S: ObjectStore + ?Sized>(
    config: &DeployConfig,
    store: &S,
    reporter: &dyn Reporter,
) -> Result<(Plan, Decision, ExecutionReport), SyncError> {
    let plan = plan(config, store, reporter)?;
    let decision = decide(config, &plan);
    let report = match decision {
        Decision::Execute => execute(config, store, &plan, reporter),
        Decision::NoChanges => {
            reporter.phase("No changes detected. All files up-to-date.");
            ExecutionReport::default()
        }
        Decision::Preview => ExecutionReport::default(),
    };
    Ok((plan, decision, report))
}
