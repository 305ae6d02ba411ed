//! Object storage access.
//!
//! The jobs only need two operations from storage: fetch an object's bytes
//! and put derived bytes under a new key with a content type. [`ImageStore`]
//! is that seam. A store is constructed once per process and handed to the
//! [`Handler`](crate::handler::Handler), which reuses it for every
//! invocation.
//!
//! | Store | Backing | Use |
//! |---|---|---|
//! | [`FsStore`] | `<root>/<bucket>/<key>` on disk | the CLI, local runs |
//! | [`MemoryStore`] | `HashMap` behind a `Mutex` | tests, embedding |
//!
//! Payloads are always encoded bytes. Transforms that produce pixels encode
//! them before anything reaches the store (see
//! [`Payload`](crate::transform::Payload)).

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },
    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },
    #[error("invalid object key: {0:?}")]
    InvalidKey(String),
    #[error("storage error: {0}")]
    Transient(String),
}

impl StoreError {
    fn from_io(err: io::Error, bucket: &str, key: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            io::ErrorKind::PermissionDenied => Self::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => Self::Transient(err.to_string()),
        }
    }
}

/// Receipt for a successful put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
    /// SHA-256 of the stored bytes, hex encoded.
    pub etag: String,
}

impl StoredObject {
    fn new(bucket: &str, key: &str, body: &[u8], content_type: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: body.len() as u64,
            content_type: content_type.to_string(),
            etag: format!("{:x}", Sha256::digest(body)),
        }
    }
}

/// Fetch/put access to bucketed object storage.
pub trait ImageStore {
    /// Raw bytes of `bucket/key`.
    fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write `body` to `bucket/key`, replacing any existing object.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StoreError>;
}

impl<S: ImageStore + ?Sized> ImageStore for &S {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        (**self).fetch(bucket, key)
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        (**self).put(bucket, key, body, content_type)
    }
}

// ============================================================================
// Filesystem store
// ============================================================================

/// Buckets as directories under a root: `bucket/a/b.jpg` lives at
/// `<root>/bucket/a/b.jpg`.
///
/// Bucket names and keys are confined to the root: absolute paths, `..`
/// segments, and backslashes are rejected with [`StoreError::InvalidKey`].
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let bucket_path = confined(bucket)?;
        let key_path = confined(key)?;
        Ok(self.root.join(bucket_path).join(key_path))
    }
}

/// Relative path for a bucket name or key, refusing anything that could
/// escape the store root.
fn confined(segment: &str) -> Result<&Path, StoreError> {
    let path = Path::new(segment);
    let escapes = segment.is_empty()
        || segment.contains('\\')
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        Err(StoreError::InvalidKey(segment.to_string()))
    } else {
        Ok(path)
    }
}

impl ImageStore for FsStore {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key)?;
        if path.is_dir() {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        std::fs::read(&path).map_err(|e| StoreError::from_io(e, bucket, key))
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::from_io(e, bucket, key))?;
        }
        std::fs::write(&path, body).map_err(|e| StoreError::from_io(e, bucket, key))?;
        Ok(StoredObject::new(bucket, key, body, content_type))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// An object held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Process-local store keyed by `(bucket, key)`.
///
/// Uses a `Mutex` so it is `Sync` and can be shared behind a reference.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), MemoryObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object, as an upstream upload would.
    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) {
        self.lock().insert(
            (bucket.to_string(), key.to_string()),
            MemoryObject {
                body,
                content_type: content_type.to_string(),
            },
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<MemoryObject> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// All keys in `bucket` starting with `prefix`, sorted.
    pub fn keys(&self, bucket: &str, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .lock()
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), MemoryObject>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ImageStore for MemoryStore {
    fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.get(bucket, key)
            .map(|object| object.body)
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StoreError> {
        self.insert(bucket, key, body.to_vec(), content_type);
        Ok(StoredObject::new(bucket, key, body, content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let receipt = store.put("b", "k.json", b"{}", "application/json").unwrap();
        assert_eq!(receipt.size, 2);
        assert_eq!(receipt.content_type, "application/json");
        assert_eq!(store.fetch("b", "k.json").unwrap(), b"{}");
        assert_eq!(store.get("b", "k.json").unwrap().content_type, "application/json");
    }

    #[test]
    fn memory_store_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.fetch("b", "nope.jpg"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn memory_store_buckets_are_separate() {
        let store = MemoryStore::new();
        store.insert("a", "x.jpg", vec![1], "image/jpeg");
        assert!(store.fetch("b", "x.jpg").is_err());
    }

    #[test]
    fn memory_store_lists_by_prefix() {
        let store = MemoryStore::new();
        store.insert("b", "processed/exif/z.json", vec![], "application/json");
        store.insert("b", "processed/exif/a.json", vec![], "application/json");
        store.insert("b", "images/a.jpg", vec![], "image/jpeg");
        assert_eq!(
            store.keys("b", "processed/"),
            vec!["processed/exif/a.json", "processed/exif/z.json"]
        );
    }

    #[test]
    fn etag_is_sha256_hex() {
        let receipt = StoredObject::new("b", "k", b"", "text/plain");
        assert_eq!(
            receipt.etag,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn fs_store_creates_nested_keys() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());

        store
            .put("photos", "processed/greyscale/cat.jpg", b"jpeg", "image/jpeg")
            .unwrap();

        let on_disk = tmp.path().join("photos/processed/greyscale/cat.jpg");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"jpeg");
        assert_eq!(
            store.fetch("photos", "processed/greyscale/cat.jpg").unwrap(),
            b"jpeg"
        );
    }

    #[test]
    fn fs_store_keys_with_spaces() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        store.put("b", "my photo.jpg", b"x", "image/jpeg").unwrap();
        assert_eq!(store.fetch("b", "my photo.jpg").unwrap(), b"x");
    }

    #[test]
    fn fs_store_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        assert!(matches!(
            store.fetch("b", "images/missing.jpg"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn fs_store_directory_is_not_an_object() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("b/images")).unwrap();
        let store = FsStore::new(tmp.path());
        assert!(matches!(
            store.fetch("b", "images"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn fs_store_rejects_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::new(tmp.path());
        for key in ["../secret", "a/../../b", "/etc/passwd", "a\\b", ""] {
            assert!(
                matches!(store.fetch("b", key), Err(StoreError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
        assert!(matches!(
            store.put("..", "x.jpg", b"", "image/jpeg"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn store_works_through_reference() {
        fn fetch_via(store: impl ImageStore) -> Vec<u8> {
            store.fetch("b", "k").unwrap()
        }
        let store = MemoryStore::new();
        store.insert("b", "k", vec![7], "application/octet-stream");
        assert_eq!(fetch_via(&store), vec![7]);
    }
}
