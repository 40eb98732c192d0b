//! Blob store client
//!
//! Capability-typed object storage: `put` / `get` / `delete` by object key.
//! The production implementation keeps objects as files under the service
//! data directory; tests substitute fault-injecting implementations through
//! the same trait.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("blob store I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Object storage contract consumed by the import saga
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any previous object.
    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), BlobError>;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    /// Remove the object stored under `key`. Deleting a missing object is
    /// not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Filesystem-backed blob store rooted at one directory
///
/// Content type is accepted for interface compatibility but not persisted;
/// the download endpoint serves everything as an octet stream.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, BlobError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "Blob store initialized");
        Ok(Self { root })
    }

    /// Resolve `key` to a path inside the root, rejecting anything that
    /// could escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty()
            || key == "."
            || key == ".."
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: Option<&str>) -> Result<(), BlobError> {
        let path = self.object_path(key)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(
            key,
            bytes = bytes.len(),
            content_type = content_type.unwrap_or("application/octet-stream"),
            "Blob stored"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.object_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(key, "Blob removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(key, "Blob already absent on delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, FsBlobStore) {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path()).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (_dir, store) = store().await;
        store.put("k1", b"payload", Some("application/json")).await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let (_dir, store) = store().await;
        assert!(matches!(store.get("nope").await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_dir, store) = store().await;
        store.put("k2", b"x", None).await.unwrap();
        store.delete("k2").await.unwrap();
        store.delete("k2").await.unwrap();
        assert!(matches!(store.get("k2").await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let (_dir, store) = store().await;
        for key in ["..", "../escape", "a/b", "a\\b", ""] {
            assert!(matches!(store.get(key).await, Err(BlobError::InvalidKey(_))));
        }
    }
}
