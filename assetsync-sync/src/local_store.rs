//! Directory-backed bucket.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   <key>                         (object body)
//!   .assetsync/
//!     objects/<key>.json          (ObjectAttributes)
//! ```
//!
//! Bodies and attribute files are written to `<path>.assetsync.tmp` and
//! renamed into place. Objects without an attribute file (copied in by hand)
//! head as an object with no attributes at all.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use assetsync_core::{ObjectKey, RemoteObject};

use crate::error::{io_err, StoreError};
use crate::store::{ObjectAttributes, ObjectStore};

/// Name of the bookkeeping directory under the bucket root.
pub const STATE_DIR: &str = ".assetsync";

const TMP_SUFFIX: &str = ".assetsync.tmp";

/// A local directory used as a bucket.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<key>`. Rejects keys that would escape the root.
    pub fn body_path(&self, key: &ObjectKey) -> Result<PathBuf, StoreError> {
        let rel = checked_relative(key)?;
        Ok(self.root.join(rel))
    }

    /// `<root>/.assetsync/objects/<key>.json`
    pub fn attrs_path(&self, key: &ObjectKey) -> Result<PathBuf, StoreError> {
        let rel = checked_relative(key)?;
        let mut path = self.root.join(STATE_DIR).join("objects").join(rel);
        let file_name = format!(
            "{}.json",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        path.set_file_name(file_name);
        Ok(path)
    }

    fn write_attrs(&self, key: &ObjectKey, attrs: &ObjectAttributes) -> Result<(), StoreError> {
        let path = self.attrs_path(key)?;
        let json = serde_json::to_string_pretty(attrs)?;
        write_atomic(&path, json.as_bytes())
    }
}

impl ObjectStore for LocalDirStore {
    fn list(&self) -> Result<Vec<ObjectKey>, StoreError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let state_dir = self.root.join(STATE_DIR);
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.path() != state_dir.as_path())
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            if rel.to_string_lossy().ends_with(TMP_SUFFIX) {
                continue;
            }
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            keys.push(ObjectKey::from(parts.join("/")));
        }
        keys.sort();
        Ok(keys)
    }

    fn head(&self, key: &ObjectKey) -> Result<RemoteObject, StoreError> {
        let body = self.body_path(key)?;
        if !body.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let attrs_path = self.attrs_path(key)?;
        match std::fs::read_to_string(&attrs_path) {
            Ok(json) => {
                let attrs: ObjectAttributes = serde_json::from_str(&json)?;
                Ok(attrs.head)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(RemoteObject::default()),
            Err(err) => Err(io_err(attrs_path, err)),
        }
    }

    fn put(&self, key: &ObjectKey, body: &Path, attrs: &ObjectAttributes) -> Result<(), StoreError> {
        let target = self.body_path(key)?;
        let bytes = std::fs::read(body).map_err(|e| io_err(body, e))?;
        write_atomic(&target, &bytes)?;
        self.write_attrs(key, attrs)
    }

    fn copy_in_place(&self, key: &ObjectKey, attrs: &ObjectAttributes) -> Result<(), StoreError> {
        if !self.body_path(key)?.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        self.write_attrs(key, attrs)
    }

    fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        remove_if_exists(&self.body_path(key)?)?;
        remove_if_exists(&self.attrs_path(key)?)
    }
}

/// Keys must be plain relative paths that stay inside the root and outside
/// the bookkeeping directory.
fn checked_relative(key: &ObjectKey) -> Result<PathBuf, StoreError> {
    let mut rel = PathBuf::new();
    for part in key.as_str().split('/') {
        let path = Path::new(part);
        match path.components().next() {
            Some(Component::Normal(_)) if path.components().count() == 1 => rel.push(part),
            _ => return Err(StoreError::InvalidKey(key.to_string())),
        }
    }
    if rel.as_os_str().is_empty() || rel.starts_with(STATE_DIR) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(rel)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}{TMP_SUFFIX}", path.display()));
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn attrs(cache_control: &str, release: &str) -> ObjectAttributes {
        let mut head = RemoteObject {
            cache_control: Some(cache_control.into()),
            content_type: Some("text/css".into()),
            ..RemoteObject::default()
        };
        head.metadata.insert("release".into(), release.into());
        ObjectAttributes {
            acl: "public-read".into(),
            head,
        }
    }

    fn body(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("body");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_root_lists_empty() {
        let tmp = TempDir::new().unwrap();
        let store = LocalDirStore::new(tmp.path().join("bucket"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn put_then_head_roundtrips_attributes() {
        let src = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let store = LocalDirStore::new(bucket.path());
        let key = ObjectKey::from("css/site.css");

        store.put(&key, &body(&src, "body{}"), &attrs("max-age=1", "4")).unwrap();

        assert_eq!(
            fs::read_to_string(bucket.path().join("css").join("site.css")).unwrap(),
            "body{}"
        );
        let head = store.head(&key).unwrap();
        assert_eq!(head.cache_control.as_deref(), Some("max-age=1"));
        assert_eq!(head.release_tag(), Some("4"));
        assert_eq!(store.list().unwrap(), vec![key]);
    }

    #[test]
    fn listing_skips_state_dir_and_tmp_files() {
        let src = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let store = LocalDirStore::new(bucket.path());
        store
            .put(&ObjectKey::from("a.js"), &body(&src, "a"), &attrs("x", "1"))
            .unwrap();
        fs::write(bucket.path().join("b.js.assetsync.tmp"), "partial").unwrap();

        let keys: Vec<String> = store.list().unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["a.js"]);
        assert!(!bucket.path().join("a.js.assetsync.tmp").exists());
    }

    #[test]
    fn foreign_object_heads_without_attributes() {
        let bucket = TempDir::new().unwrap();
        fs::write(bucket.path().join("hand-copied.txt"), "hi").unwrap();
        let store = LocalDirStore::new(bucket.path());
        let head = store.head(&ObjectKey::from("hand-copied.txt")).unwrap();
        assert_eq!(head, RemoteObject::default());
    }

    #[test]
    fn copy_in_place_rewrites_attributes_only() {
        let src = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let store = LocalDirStore::new(bucket.path());
        let key = ObjectKey::from("a.css");
        store.put(&key, &body(&src, "v1"), &attrs("old", "1")).unwrap();

        store.copy_in_place(&key, &attrs("new", "9")).unwrap();

        let head = store.head(&key).unwrap();
        assert_eq!(head.cache_control.as_deref(), Some("new"));
        assert_eq!(head.release_tag(), Some("9"));
        assert_eq!(fs::read_to_string(bucket.path().join("a.css")).unwrap(), "v1");
    }

    #[test]
    fn delete_removes_body_and_attributes() {
        let src = TempDir::new().unwrap();
        let bucket = TempDir::new().unwrap();
        let store = LocalDirStore::new(bucket.path());
        let key = ObjectKey::from("old/a.js");
        store.put(&key, &body(&src, "a"), &attrs("x", "1")).unwrap();

        store.delete(&key).unwrap();
        assert!(!store.body_path(&key).unwrap().exists());
        assert!(!store.attrs_path(&key).unwrap().exists());
        store.delete(&key).expect("second delete is a no-op");
    }

    #[test]
    fn escaping_keys_are_rejected() {
        let store = LocalDirStore::new("/srv/bucket");
        for bad in ["../etc/passwd", "/abs", "a//b", ".assetsync/objects/x.json", ""] {
            let err = store.body_path(&ObjectKey::from(bad)).unwrap_err();
            assert!(matches!(err, StoreError::InvalidKey(_)), "{bad}: {err}");
        }
    }
}
