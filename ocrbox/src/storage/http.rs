use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{OcrboxError, Result};

use super::{join_url, ObjectStorage, StoredObject};

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: Option<String>,
}

/// Object storage behind a plain HTTP endpoint: `PUT {base}/{key}` to store,
/// `DELETE {base}/{key}` to remove.
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| OcrboxError::Storage(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    fn name(&self) -> &str {
        "http"
    }

    async fn put(&self, key: &str, bytes: &[u8], mime_type: &str) -> Result<StoredObject> {
        let url = join_url(&self.base_url, key);

        let response = self
            .authorize(self.client.put(&url))
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| OcrboxError::Storage(format!("Upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrboxError::Storage(format!(
                "Upload failed: {status} - {body}"
            )));
        }

        // Servers may answer with the canonical URL; otherwise the PUT target is it.
        let body = response.bytes().await.unwrap_or_default();
        let public_url = serde_json::from_slice::<PutResponse>(&body)
            .ok()
            .and_then(|r| r.url)
            .filter(|u| !u.is_empty())
            .unwrap_or(url);

        debug!(key, size = bytes.len(), "Stored object over HTTP");
        Ok(StoredObject {
            key: key.to_string(),
            url: public_url,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(join_url(&self.base_url, key)))
            .send()
            .await
            .map_err(|e| OcrboxError::Storage(format!("Delete failed: {e}")))?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => Err(OcrboxError::Storage(format!("Delete failed: {s}"))),
        }
    }
}
