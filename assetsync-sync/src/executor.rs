//! Plan execution against an [`ObjectStore`].
//!
//! Actions run in groups (uploads, in-place updates, deletes) and in key
//! order inside each group. Every key is attempted; a failure is
//! recorded in the [`ExecutionReport`] and the next key proceeds.

use serde::Serialize;

use assetsync_core::{Action, DeployConfig, ObjectKey, Plan, PlanEntry, RemoteObject};

use crate::error::StoreError;
use crate::report::Reporter;
use crate::store::{ObjectAttributes, ObjectStore};

/// Result of one executed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub key: ObjectKey,
    pub action: Action,
    /// `None` on success.
    pub error: Option<String>,
}

/// Every action attempted during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn succeeded(&self, action: Action) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.action == action && o.error.is_none())
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Carry out every upload, update and delete in `plan`.
pub fn execute<S: ObjectStore + ?Sized>(
    config: &DeployConfig,
    store: &S,
    plan: &Plan,
    reporter: &dyn Reporter,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();

    for group in [Action::Upload, Action::Update, Action::Delete] {
        let entries: Vec<_> = plan
            .iter()
            .filter(|(_, entry)| entry.action() == group)
            .collect();
        if entries.is_empty() {
            continue;
        }
        reporter.phase(match group {
            Action::Upload => "Uploading new files...",
            Action::Update => "Updating files in-place...",
            _ => "Deleting remote files...",
        });

        for (key, entry) in entries {
            let result = apply(config, store, key, entry, reporter);
            if let Err(err) = &result {
                reporter.failure(key, &format!("{group} failed: {err}"));
            }
            report.outcomes.push(ActionOutcome {
                key: key.clone(),
                action: group,
                error: result.err().map(|e| e.to_string()),
            });
        }
    }

    report
}

fn apply<S: ObjectStore + ?Sized>(
    config: &DeployConfig,
    store: &S,
    key: &ObjectKey,
    entry: &PlanEntry,
    reporter: &dyn Reporter,
) -> Result<(), StoreError> {
    match entry {
        PlanEntry::Upload { file } => {
            reporter.detail(key, "uploading");
            let mut head = RemoteObject {
                cache_control: Some(config.cache_control.clone()),
                content_type: file.content_type.clone(),
                content_encoding: file.content_encoding.clone(),
                ..RemoteObject::default()
            };
            head.set_release(config.release);
            store.put(key, &file.path, &attributes(config, head))
        }
        PlanEntry::UpdateMetadata { desired, .. } => {
            reporter.detail(key, "updating in-place");
            let mut head = desired.clone();
            head.cache_control = Some(config.cache_control.clone());
            head.set_release(config.release);
            store.copy_in_place(key, &attributes(config, head))
        }
        PlanEntry::Delete { .. } => {
            reporter.detail(key, "deleting");
            store.delete(key)
        }
        PlanEntry::Keep { .. } | PlanEntry::Skip => Ok(()),
    }
}

fn attributes(config: &DeployConfig, head: RemoteObject) -> ObjectAttributes {
    ObjectAttributes {
        acl: config.acl.clone(),
        head,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use assetsync_core::{Drift, LocalFile, Release};
    use tempfile::TempDir;

    use super::*;
    use crate::report::RecordingReporter;
    use crate::store::MemoryStore;

    fn config() -> DeployConfig {
        DeployConfig {
            bucket: "mem://".into(),
            cache_control: "max-age=60".into(),
            release: Release(7),
            ..DeployConfig::default()
        }
    }

    fn local(dir: &Path, key: &str) -> LocalFile {
        let path = dir.join(key);
        fs::write(&path, key).unwrap();
        LocalFile {
            key: ObjectKey::from(key),
            path,
            content_type: Some("text/css".into()),
            content_encoding: Some("gzip".into()),
        }
    }

    #[test]
    fn upload_writes_body_and_attributes() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let mut plan = Plan::default();
        plan.entries.insert(
            ObjectKey::from("site.css"),
            PlanEntry::Upload {
                file: local(tmp.path(), "site.css"),
            },
        );

        let report = execute(&config(), &store, &plan, &RecordingReporter::new());

        assert!(report.is_success());
        let stored = store.object("site.css").expect("uploaded");
        assert_eq!(stored.body, b"site.css");
        assert_eq!(stored.attrs.acl, "public-read");
        assert_eq!(stored.attrs.head.cache_control.as_deref(), Some("max-age=60"));
        assert_eq!(stored.attrs.head.content_encoding.as_deref(), Some("gzip"));
        assert_eq!(stored.attrs.head.release(), Release(7));
    }

    #[test]
    fn update_replaces_attributes_with_merged_object() {
        let store = MemoryStore::new();
        store.insert("a.js", b"body", RemoteObject::default());
        let mut desired = RemoteObject {
            cache_control: Some("max-age=60".into()),
            content_type: Some("text/javascript".into()),
            ..RemoteObject::default()
        };
        desired.metadata.insert("owner".into(), "web".into());

        let mut plan = Plan::default();
        plan.entries.insert(
            ObjectKey::from("a.js"),
            PlanEntry::UpdateMetadata {
                desired,
                drift: vec![Drift::MissingRelease],
            },
        );

        let report = execute(&config(), &store, &plan, &RecordingReporter::new());

        assert_eq!(report.succeeded(Action::Update), 1);
        let stored = store.object("a.js").expect("still there");
        assert_eq!(stored.body, b"body");
        assert_eq!(stored.attrs.head.release(), Release(7));
        assert_eq!(stored.attrs.head.metadata.get("owner"), Some(&"web".to_string()));
    }

    #[test]
    fn one_failure_does_not_block_other_keys() {
        let store = MemoryStore::new();
        for key in ["a.js", "b.js", "c.js"] {
            store.insert(key, b"", RemoteObject::default());
        }
        store.fail_on("b.js");

        let mut plan = Plan::default();
        for key in ["a.js", "b.js", "c.js"] {
            plan.entries
                .insert(ObjectKey::from(key), PlanEntry::Delete { release: Release(1) });
        }

        let reporter = RecordingReporter::new();
        let report = execute(&config(), &store, &plan, &reporter);

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.succeeded(Action::Delete), 2);
        let failed: Vec<_> = report.failures().map(|o| o.key.to_string()).collect();
        assert_eq!(failed, vec!["b.js"]);
        assert_eq!(store.keys(), vec![ObjectKey::from("b.js")]);
        assert!(reporter.lines().iter().any(|l| l.starts_with("failure b.js")));
    }

    #[test]
    fn groups_run_uploads_then_updates_then_deletes() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryStore::new();
        store.insert("a-old.js", b"", RemoteObject::default());
        store.insert("m.js", b"", RemoteObject::default());

        let mut plan = Plan::default();
        plan.entries
            .insert(ObjectKey::from("a-old.js"), PlanEntry::Delete { release: Release(1) });
        plan.entries.insert(
            ObjectKey::from("m.js"),
            PlanEntry::UpdateMetadata {
                desired: RemoteObject::default(),
                drift: vec![Drift::MissingRelease],
            },
        );
        plan.entries.insert(
            ObjectKey::from("z.css"),
            PlanEntry::Upload {
                file: local(tmp.path(), "z.css"),
            },
        );

        let report = execute(&config(), &store, &plan, &RecordingReporter::new());
        let order: Vec<_> = report.outcomes.iter().map(|o| o.action).collect();
        assert_eq!(order, vec![Action::Upload, Action::Update, Action::Delete]);
    }
}
