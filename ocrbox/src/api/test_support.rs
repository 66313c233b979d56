//! Shared fixtures for router and middleware tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::state::AppState;
use crate::config::{
    ApiKey, Config, DatabaseConfig, OcrConfig, ServerConfig, StorageBackendKind, StorageConfig,
};
use crate::error::{OcrboxError, Result};
use crate::ocr::{BackendFactory, EngineRegistry, Recognition, RecognitionBackend};
use crate::storage::LocalObjectStorage;

pub const TEST_KEY: &str = "alice:test-key";

pub struct ScriptedWorker;

#[async_trait]
impl RecognitionBackend for ScriptedWorker {
    async fn recognize(&self, _image: &[u8]) -> Result<Recognition> {
        Ok(Recognition {
            text: "Hello World".to_string(),
            confidence: Some(0.876),
        })
    }
}

pub struct ScriptedFactory;

#[async_trait]
impl BackendFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create(&self, language: &str) -> Result<Arc<dyn RecognitionBackend>> {
        if language == "xxx" {
            return Err(OcrboxError::OcrInit("no traineddata for xxx".into()));
        }
        Ok(Arc::new(ScriptedWorker))
    }
}

pub fn test_config(api_keys: &[&str], storage_dir: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys: api_keys.iter().filter_map(|k| ApiKey::parse(k)).collect(),
            max_body_bytes: 1024 * 1024,
        },
        database: DatabaseConfig {
            enabled: true,
            url: ":memory:".to_string(),
            auth_token: None,
            local_path: None,
        },
        storage: StorageConfig {
            backend: StorageBackendKind::Local,
            local_dir: storage_dir.to_string_lossy().into_owned(),
            public_url: "http://localhost:3000/files".to_string(),
            http_url: None,
            http_token: None,
            timeout_secs: 5,
        },
        ocr: OcrConfig::default(),
    }
}

pub async fn test_state(api_keys: &[&str], storage_dir: &Path) -> AppState {
    let config = test_config(api_keys, storage_dir);

    let db = crate::db::open_backend(&config.database).await.unwrap();
    let engines = Arc::new(EngineRegistry::new(
        Arc::new(ScriptedFactory),
        &config.ocr.default_language,
    ));
    let storage = Arc::new(LocalObjectStorage::new(
        &config.storage.local_dir,
        &config.storage.public_url,
    ));

    AppState::new(config, db, engines, storage)
}
