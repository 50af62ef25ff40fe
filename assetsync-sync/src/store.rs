//! Object store seam.
//!
//! [`ObjectStore`] is the narrow interface the inventory and the executor
//! need: list, head, put, copy-in-place and delete. Two backends ship with
//! the crate:
//!
//! - [`MemoryStore`]: mutex-guarded map with per-key failure injection.
//! - [`LocalDirStore`](crate::local_store::LocalDirStore): a directory acting
//!   as the bucket.
//!
//! [`open`] maps a bucket locator onto a backend.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use assetsync_core::{ObjectKey, RemoteObject};

use crate::error::{io_err, StoreError};
use crate::local_store::LocalDirStore;

/// Attributes written alongside an object body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectAttributes {
    pub acl: String,
    #[serde(flatten)]
    pub head: RemoteObject,
}

/// Minimal bucket interface used by the deploy pipeline.
pub trait ObjectStore {
    /// Every key currently in the bucket.
    fn list(&self) -> Result<Vec<ObjectKey>, StoreError>;

    /// Attributes of one object.
    fn head(&self, key: &ObjectKey) -> Result<RemoteObject, StoreError>;

    /// Upload `body` under `key`, replacing any existing object.
    fn put(&self, key: &ObjectKey, body: &Path, attrs: &ObjectAttributes) -> Result<(), StoreError>;

    /// Server-side copy of `key` onto itself with replaced attributes.
    fn copy_in_place(&self, key: &ObjectKey, attrs: &ObjectAttributes) -> Result<(), StoreError>;

    /// Remove `key`. Deleting a missing key succeeds.
    fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;
}

/// Open the backend named by `bucket`.
///
/// - `mem://…`: fresh, empty [`MemoryStore`]
/// - `file://<dir>` or a bare path: [`LocalDirStore`] rooted at `<dir>`
pub fn open(bucket: &str) -> Result<Box<dyn ObjectStore>, StoreError> {
    if bucket.starts_with("mem://") {
        return Ok(Box::new(MemoryStore::new()));
    }
    if let Some(dir) = bucket.strip_prefix("file://") {
        return Ok(Box::new(LocalDirStore::new(dir)));
    }
    if bucket.contains("://") {
        return Err(StoreError::UnsupportedScheme(bucket.to_string()));
    }
    Ok(Box::new(LocalDirStore::new(bucket)))
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// One object held by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub attrs: ObjectAttributes,
}

/// In-memory bucket.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<ObjectKey, StoredObject>>,
    failing: Mutex<BTreeSet<ObjectKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through `put`.
    pub fn insert(&self, key: impl Into<ObjectKey>, body: &[u8], head: RemoteObject) {
        self.objects().insert(
            key.into(),
            StoredObject {
                body: body.to_vec(),
                attrs: ObjectAttributes {
                    acl: String::new(),
                    head,
                },
            },
        );
    }

    /// Make every operation on `key` fail.
    pub fn fail_on(&self, key: impl Into<ObjectKey>) {
        self.failing().insert(key.into());
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects().get(&ObjectKey::from(key)).cloned()
    }

    pub fn keys(&self) -> Vec<ObjectKey> {
        self.objects().keys().cloned().collect()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<ObjectKey, StoredObject>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failing(&self) -> MutexGuard<'_, BTreeSet<ObjectKey>> {
        self.failing.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self, key: &ObjectKey) -> Result<(), StoreError> {
        if self.failing().contains(key) {
            return Err(StoreError::Injected(key.to_string()));
        }
        Ok(())
    }
}

impl ObjectStore for MemoryStore {
    fn list(&self) -> Result<Vec<ObjectKey>, StoreError> {
        Ok(self.keys())
    }

    fn head(&self, key: &ObjectKey) -> Result<RemoteObject, StoreError> {
        self.check(key)?;
        self.objects()
            .get(key)
            .map(|o| o.attrs.head.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &ObjectKey, body: &Path, attrs: &ObjectAttributes) -> Result<(), StoreError> {
        self.check(key)?;
        let body = std::fs::read(body).map_err(|e| io_err(body, e))?;
        self.objects().insert(
            key.clone(),
            StoredObject {
                body,
                attrs: attrs.clone(),
            },
        );
        Ok(())
    }

    fn copy_in_place(&self, key: &ObjectKey, attrs: &ObjectAttributes) -> Result<(), StoreError> {
        self.check(key)?;
        let mut objects = self.objects();
        let object = objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        object.attrs = attrs.clone();
        Ok(())
    }

    fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.check(key)?;
        self.objects().remove(key);
        Ok(())
    }
}
