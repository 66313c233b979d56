use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{OcrboxError, Result};

use super::{join_url, ObjectStorage, StoredObject};

/// Stores objects as files under `root`; URLs are `public_url/<key>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.to_string(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !is_plain {
            return Err(OcrboxError::Storage(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, key: &str, bytes: &[u8], _mime_type: &str) -> Result<StoredObject> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OcrboxError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| OcrboxError::Storage(format!("Failed to write object: {e}")))?;

        debug!(key, size = bytes.len(), "Stored object on local disk");
        Ok(StoredObject {
            key: key.to_string(),
            url: join_url(&self.public_url, key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OcrboxError::Storage(format!("Failed to delete object: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_public_url() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:3000/files/");

        let stored = storage
            .put("ocr/alice/1-scan.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        assert_eq!(stored.url, "http://localhost:3000/files/ocr/alice/1-scan.png");
        let written = std::fs::read(dir.path().join("ocr/alice/1-scan.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/files");

        storage.put("ocr/u/a.png", b"x", "image/png").await.unwrap();
        storage.delete("ocr/u/a.png").await.unwrap();
        assert!(!dir.path().join("ocr/u/a.png").exists());

        storage.delete("ocr/u/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_keys_escaping_root() {
        let dir = TempDir::new().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost/files");

        for key in ["../outside.png", "/etc/passwd", ""] {
            let err = storage.put(key, b"x", "image/png").await.unwrap_err();
            assert!(matches!(err, OcrboxError::Storage(_)), "{key:?}");
        }
    }
}
