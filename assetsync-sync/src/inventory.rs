//! Remote inventory: one `head` per listed key.

use std::collections::BTreeSet;

use assetsync_core::{ObjectKey, RemoteInventory};

use crate::error::StoreError;
use crate::report::Reporter;
use crate::store::ObjectStore;

/// What one listing of the bucket produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub objects: RemoteInventory,
    /// Listed keys whose `head` failed. They exist remotely but their
    /// attributes are unknown.
    pub unreadable: BTreeSet<ObjectKey>,
}

/// Snapshot the bucket.
///
/// A failed listing aborts; a failed `head` is reported and the key lands in
/// [`RemoteSnapshot::unreadable`] instead of the inventory.
pub fn fetch<S: ObjectStore + ?Sized>(
    store: &S,
    reporter: &dyn Reporter,
) -> Result<RemoteSnapshot, StoreError> {
    reporter.phase("Reading bucket for existing files...");

    let mut snapshot = RemoteSnapshot::default();
    for key in store.list()? {
        match store.head(&key) {
            Ok(object) => {
                snapshot.objects.insert(key, object);
            }
            Err(err) => {
                reporter.failure(&key, &format!("skipped, head failed: {err}"));
                snapshot.unreadable.insert(key);
            }
        }
    }

    reporter.phase(&format!("Found {} remote objects", snapshot.objects.len()));
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetsync_core::RemoteObject;

    use crate::report::RecordingReporter;
    use crate::store::MemoryStore;

    #[test]
    fn head_failure_drops_only_that_key() {
        let store = MemoryStore::new();
        store.insert("a.js", b"a", RemoteObject::default());
        store.insert("b.js", b"b", RemoteObject::default());
        store.fail_on("b.js");

        let reporter = RecordingReporter::new();
        let snapshot = fetch(&store, &reporter).expect("fetch");

        assert!(snapshot.objects.contains_key(&ObjectKey::from("a.js")));
        assert!(!snapshot.objects.contains_key(&ObjectKey::from("b.js")));
        assert!(reporter
            .lines()
            .iter()
            .any(|l| l.starts_with("failure b.js: skipped")));
    }

    #[test]
    fn head_failure_is_remembered_as_unreadable() {
        let store = MemoryStore::new();
        store.insert("a.js", b"a", RemoteObject::default());
        store.insert("b.js", b"b", RemoteObject::default());
        store.fail_on("b.js");

        let snapshot = fetch(&store, &RecordingReporter::new()).expect("fetch");

        assert_eq!(
            snapshot.unreadable.into_iter().collect::<Vec<_>>(),
            vec![ObjectKey::from("b.js")]
        );
    }
}
