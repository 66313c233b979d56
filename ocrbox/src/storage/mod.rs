//! Object storage for original uploaded images.
//!
//! Backends store opaque bytes under a key and hand back a URL the client can
//! fetch the image from:
//! - `LocalObjectStorage`: files under a directory served at `/files`
//! - `HttpObjectStorage`: `PUT`/`DELETE` against an HTTP object endpoint

mod http;
mod local;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{StorageBackendKind, StorageConfig};
use crate::error::{OcrboxError, Result};

pub use http::HttpObjectStorage;
pub use local::LocalObjectStorage;

const MAX_FILE_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    fn name(&self) -> &str;

    async fn put(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<StoredObject>;

    /// Deleting a key that does not exist is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

pub fn build_storage(config: &StorageConfig) -> Result<Arc<dyn ObjectStorage>> {
    match config.backend {
        StorageBackendKind::Local => Ok(Arc::new(LocalObjectStorage::new(
            &config.local_dir,
            &config.public_url,
        ))),
        StorageBackendKind::Http => {
            let url = config.http_url.as_deref().ok_or_else(|| {
                OcrboxError::Storage("STORAGE_HTTP_URL is required for the http backend".into())
            })?;
            Ok(Arc::new(HttpObjectStorage::new(
                url,
                config.http_token.clone(),
                config.timeout_secs,
            )?))
        }
    }
}

/// `ocr/<user>/<uuid>-<file name>`, unique per call and scoped by user.
pub fn object_key(user_id: &str, file_name: &str) -> String {
    format!(
        "ocr/{}/{}-{}",
        sanitize_segment(user_id),
        uuid::Uuid::new_v4(),
        sanitize_segment(file_name)
    )
}

/// Reduce a client-supplied name to one safe path segment.
pub fn sanitize_segment(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect();

    if cleaned.chars().all(|c| c == '.' || c == '_') {
        "image".to_string()
    } else {
        cleaned
    }
}

fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
