//! Domain types shared by the scanner, the planner and the CLI.
//!
//! Optional object attributes are `Option<String>`; the planner relies on the
//! three-way distinction between "absent", "present and matching" and
//! "present and different".

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata entry that records which release last published an object.
pub const RELEASE_METADATA_KEY: &str = "release";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Object-store key: the `/`-separated path of an asset relative to the
/// source root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(pub String);

impl ObjectKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ObjectKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A deploy release number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Release(pub u64);

impl Release {
    /// Parse a stored release tag. Anything that is not a base-10 unsigned
    /// integer reads as release `0`, i.e. older than every real release.
    pub fn parse_lossy(raw: &str) -> Self {
        Self(raw.trim().parse().unwrap_or(0))
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for Release {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

// ---------------------------------------------------------------------------
// Inventories
// ---------------------------------------------------------------------------

/// One matched on-disk asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub key: ObjectKey,
    /// Filesystem path of the upload body.
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
}

/// Snapshot of one object currently in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RemoteObject {
    /// Raw `release` metadata value. Stores differ in how they case user
    /// metadata names, so the lookup ignores ASCII case.
    pub fn release_tag(&self) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(RELEASE_METADATA_KEY))
            .map(|(_, value)| value.as_str())
    }

    /// Recorded release, `0` when the tag is missing or malformed.
    pub fn release(&self) -> Release {
        self.release_tag().map(Release::parse_lossy).unwrap_or_default()
    }

    /// Replace every casing of the `release` entry with `release = value`.
    pub fn set_release(&mut self, release: Release) {
        self.metadata
            .retain(|name, _| !name.eq_ignore_ascii_case(RELEASE_METADATA_KEY));
        self.metadata
            .insert(RELEASE_METADATA_KEY.to_string(), release.to_string());
    }
}

pub type LocalInventory = BTreeMap<ObjectKey, LocalFile>;
pub type RemoteInventory = BTreeMap<ObjectKey, RemoteObject>;

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A single metadata discrepancy between a local asset and its remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Drift {
    CacheControl {
        expected: String,
        found: Option<String>,
    },
    ContentType {
        expected: String,
        found: Option<String>,
    },
    ContentEncoding {
        expected: String,
        found: Option<String>,
    },
    MissingRelease,
    ReleaseRefresh { from: Release, to: Release },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drift::CacheControl { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "Wrong Cache-Control, expected: {expected}, got: {found}"
                ),
                None => write!(f, "Missing Cache-Control"),
            },
            Drift::ContentType { expected, found } => match found {
                Some(found) => write!(f, "Wrong Content-Type, expected {expected}, got {found}"),
                None => write!(f, "Missing Content-Type: {expected}"),
            },
            Drift::ContentEncoding { expected, found } => match found {
                Some(found) => write!(
                    f,
                    "Wrong Content-Encoding, expected {expected}, got {found}"
                ),
                None => write!(f, "Missing Content-Encoding: {expected}"),
            },
            Drift::MissingRelease => write!(f, "Missing release metadata"),
            Drift::ReleaseRefresh { from, to } => {
                write!(f, "Update release from {from} to {to}")
            }
        }
    }
}

/// Why a key is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeepReason {
    /// Present locally and remotely with correct metadata.
    UpToDate,
    /// Remote-only, but its release is inside the keep window.
    Retained,
    /// Remote-only and evictable, but cleaning is disabled.
    CleanDisabled,
    /// Listed in the bucket, but its attributes could not be read.
    Unreadable,
}

/// Decided action for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlanEntry {
    Upload { file: LocalFile },
    UpdateMetadata {
        desired: RemoteObject,
        drift: Vec<Drift>,
    },
    Delete { release: Release },
    Keep { reason: KeepReason },
    /// Local-only while both deploy and dry-run are disabled.
    Skip,
}

impl PlanEntry {
    pub fn action(&self) -> Action {
        match self {
            PlanEntry::Upload { .. } => Action::Upload,
            PlanEntry::UpdateMetadata { .. } => Action::Update,
            PlanEntry::Delete { .. } => Action::Delete,
            PlanEntry::Keep { .. } => Action::Keep,
            PlanEntry::Skip => Action::Skip,
        }
    }
}

/// Action kind without payload, used for rendering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Upload,
    Update,
    Delete,
    Keep,
    Skip,
}

impl Action {
    /// Plan-listing marker.
    pub fn marker(self) -> char {
        match self {
            Action::Upload => '+',
            Action::Update => '~',
            Action::Delete => '-',
            Action::Keep | Action::Skip => ' ',
        }
    }

    /// Whether the action mutates the bucket.
    pub fn is_change(self) -> bool {
        matches!(self, Action::Upload | Action::Update | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Upload => write!(f, "upload"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Keep => write!(f, "keep"),
            Action::Skip => write!(f, "skip"),
        }
    }
}

/// Per-action totals of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanCounts {
    pub upload: usize,
    pub update: usize,
    pub delete: usize,
    pub keep: usize,
    pub skip: usize,
}

/// The complete action plan, one entry per key, iterated in key order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub entries: BTreeMap<ObjectKey, PlanEntry>,
}

impl Plan {
    pub fn get(&self, key: &str) -> Option<&PlanEntry> {
        self.entries.get(&ObjectKey::from(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every key, sorted lexicographically.
    pub fn sorted_keys(&self) -> Vec<&ObjectKey> {
        self.entries.keys().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &PlanEntry)> {
        self.entries.iter()
    }

    /// True when at least one upload, update or delete is planned.
    pub fn has_changes(&self) -> bool {
        self.entries.values().any(|e| e.action().is_change())
    }

    pub fn counts(&self) -> PlanCounts {
        let mut counts = PlanCounts::default();
        for entry in self.entries.values() {
            match entry.action() {
                Action::Upload => counts.upload += 1,
                Action::Update => counts.update += 1,
                Action::Delete => counts.delete += 1,
                Action::Keep => counts.keep += 1,
                Action::Skip => counts.skip += 1,
            }
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_parse_lossy_defaults_to_zero() {
        assert_eq!(Release::parse_lossy("42"), Release(42));
        assert_eq!(Release::parse_lossy(" 7\n"), Release(7));
        assert_eq!(Release::parse_lossy("v12"), Release(0));
        assert_eq!(Release::parse_lossy(""), Release(0));
        assert_eq!(Release::parse_lossy("-3"), Release(0));
    }

    #[test]
    fn release_tag_lookup_ignores_case() {
        let mut obj = RemoteObject::default();
        obj.metadata.insert("Release".into(), "18".into());
        assert_eq!(obj.release(), Release(18));

        obj.set_release(Release(20));
        assert_eq!(obj.metadata.len(), 1);
        assert_eq!(obj.metadata.get("release"), Some(&"20".to_string()));
    }

    #[test]
    fn set_release_keeps_unrelated_metadata() {
        let mut obj = RemoteObject::default();
        obj.metadata.insert("owner".into(), "web".into());
        obj.set_release(Release(3));
        assert_eq!(obj.metadata.get("owner"), Some(&"web".to_string()));
        assert_eq!(obj.release(), Release(3));
    }

    #[test]
    fn plan_counts_and_changes() {
        let mut plan = Plan::default();
        plan.entries.insert(
            ObjectKey::from("b.js"),
            PlanEntry::Keep {
                reason: KeepReason::UpToDate,
            },
        );
        assert!(!plan.has_changes());

        plan.entries
            .insert(ObjectKey::from("a.js"), PlanEntry::Delete { release: Release(1) });
        assert!(plan.has_changes());

        let counts = plan.counts();
        assert_eq!(counts.delete, 1);
        assert_eq!(counts.keep, 1);
        let keys: Vec<_> = plan.sorted_keys().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["a.js", "b.js"]);
    }

    #[test]
    fn skip_is_not_a_change() {
        assert!(!Action::Skip.is_change());
        assert_eq!(Action::Upload.marker(), '+');
        assert_eq!(Action::Update.marker(), '~');
        assert_eq!(Action::Delete.marker(), '-');
    }

    #[test]
    fn drift_messages() {
        let missing = Drift::CacheControl {
            expected: "x".into(),
            found: None,
        };
        assert_eq!(missing.to_string(), "Missing Cache-Control");
        let refresh = Drift::ReleaseRefresh {
            from: Release(18),
            to: Release(20),
        };
        assert_eq!(refresh.to_string(), "Update release from 18 to 20");
    }
}
