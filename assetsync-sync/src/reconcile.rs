//! Reconciliation of the local and remote inventories into an action plan.
//!
//! Two passes over the inventories:
//!
//! 1. Every local key: `force` uploads, missing objects upload (deploy or
//!    dry-run) or are skipped, existing objects get their metadata compared
//!    and either corrected in place or kept.
//! 2. Every remote-only key: deleted when cleaning (or previewing) and the
//!    retention window has passed, kept otherwise.
//!
//! The function is pure. Findings travel inside the plan as [`Drift`] values
//! so callers decide how to report them.

use assetsync_core::{
    DeployConfig, Drift, KeepReason, LocalFile, LocalInventory, Plan, PlanEntry, Release,
    RemoteInventory, RemoteObject,
};

use crate::retention::is_evictable;

/// Compute the action plan for one deploy run.
///
/// The plan holds exactly one entry for every key in either inventory.
pub fn reconcile(local: &LocalInventory, remote: &RemoteInventory, config: &DeployConfig) -> Plan {
    let mut plan = Plan::default();

    for (key, file) in local {
        let entry = plan_local(file, remote.get(key), config);
        plan.entries.insert(key.clone(), entry);
    }

    for (key, object) in remote {
        if local.contains_key(key) {
            continue;
        }
        plan.entries.insert(key.clone(), plan_orphan(object, config));
    }

    plan
}

fn plan_local(file: &LocalFile, remote: Option<&RemoteObject>, config: &DeployConfig) -> PlanEntry {
    if config.force {
        return PlanEntry::Upload { file: file.clone() };
    }

    let Some(object) = remote else {
        return if config.deploy || config.dry_run {
            PlanEntry::Upload { file: file.clone() }
        } else {
            PlanEntry::Skip
        };
    };

    let (desired, drift) = merge_metadata(file, object, config);
    if drift.is_empty() {
        PlanEntry::Keep {
            reason: KeepReason::UpToDate,
        }
    } else {
        PlanEntry::UpdateMetadata { desired, drift }
    }
}

fn plan_orphan(object: &RemoteObject, config: &DeployConfig) -> PlanEntry {
    let release = object.release();
    if !is_evictable(release, config.release, config.keep) {
        return PlanEntry::Keep {
            reason: KeepReason::Retained,
        };
    }
    if config.clean || config.dry_run {
        PlanEntry::Delete { release }
    } else {
        PlanEntry::Keep {
            reason: KeepReason::CleanDisabled,
        }
    }
}

/// Compare every managed attribute of `object` against what `file` and
/// `config` expect. Returns the merged object and the fields that differed.
///
/// The merged object always carries `release = config.release`.
pub(crate) fn merge_metadata(
    file: &LocalFile,
    object: &RemoteObject,
    config: &DeployConfig,
) -> (RemoteObject, Vec<Drift>) {
    let mut desired = object.clone();
    let mut drift = Vec::new();

    if object.cache_control.as_deref() != Some(config.cache_control.as_str()) {
        drift.push(Drift::CacheControl {
            expected: config.cache_control.clone(),
            found: object.cache_control.clone(),
        });
    }
    desired.cache_control = Some(config.cache_control.clone());

    if let Some(expected) = wanted(&file.content_type, &object.content_type) {
        drift.push(Drift::ContentType {
            expected: expected.to_string(),
            found: object.content_type.clone(),
        });
        desired.content_type = Some(expected.to_string());
    }

    if let Some(expected) = wanted(&file.content_encoding, &object.content_encoding) {
        drift.push(Drift::ContentEncoding {
            expected: expected.to_string(),
            found: object.content_encoding.clone(),
        });
        desired.content_encoding = Some(expected.to_string());
    }

    if let Some(d) = release_drift(object, config) {
        drift.push(d);
    }
    desired.set_release(config.release);

    (desired, drift)
}

/// The local value, when it is non-empty and differs from the remote one.
/// A local file without an inferred value never clears a remote value.
fn wanted<'a>(local: &'a Option<String>, remote: &Option<String>) -> Option<&'a str> {
    let local = local.as_deref().filter(|v| !v.is_empty())?;
    if remote.as_deref() == Some(local) {
        None
    } else {
        Some(local)
    }
}

fn release_drift(object: &RemoteObject, config: &DeployConfig) -> Option<Drift> {
    let Some(tag) = object.release_tag() else {
        return Some(Drift::MissingRelease);
    };
    let recorded = Release::parse_lossy(tag);
    if recorded == config.release {
        return None;
    }
    // Still-served objects inside the window move forward to the current
    // release; objects already past it are left for a later refresh or cleanup.
    if is_evictable(recorded, config.release, config.keep) {
        None
    } else {
        Some(Drift::ReleaseRefresh {
            from: recorded,
            to: config.release,
        })
    }
}
