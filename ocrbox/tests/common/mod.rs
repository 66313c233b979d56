// Shared helpers for integration tests
#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use image::{ImageBuffer, ImageFormat, Rgb};
use tempfile::TempDir;

use ocrbox::api::{create_router, AppState};
use ocrbox::config::{
    ApiKey, Config, DatabaseConfig, OcrConfig, ServerConfig, StorageBackendKind, StorageConfig,
};
use ocrbox::db::{open_backend, DatabaseBackend};
use ocrbox::ocr::{BackendFactory, EngineRegistry, Recognition, RecognitionBackend};
use ocrbox::storage::ObjectStorage;
use ocrbox::{OcrboxError, Result};

pub use serial_test::serial;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Recognition worker that answers with fixed text and confidence.
pub struct ScriptedWorker {
    text: String,
    confidence: Option<f32>,
}

#[async_trait]
impl RecognitionBackend for ScriptedWorker {
    async fn recognize(&self, image: &[u8]) -> Result<Recognition> {
        if image.is_empty() {
            return Err(OcrboxError::Ocr("Failed to set image: empty input".into()));
        }
        Ok(Recognition {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Factory counting how many workers it built. Languages listed in
/// `failing_languages` fail to initialize; `fail_first` makes the very first
/// construction fail regardless of language.
pub struct ScriptedFactory {
    pub text: String,
    pub confidence: Option<f32>,
    pub failing_languages: Vec<String>,
    pub fail_first: bool,
    pub created: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(text: &str, confidence: Option<f32>) -> Self {
        Self {
            text: text.to_string(),
            confidence,
            failing_languages: Vec::new(),
            fail_first: false,
            created: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendFactory for ScriptedFactory {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn create(&self, language: &str) -> Result<Arc<dyn RecognitionBackend>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if (self.fail_first && attempt == 0)
            || self.failing_languages.iter().any(|l| l == language)
        {
            return Err(OcrboxError::OcrInit(format!(
                "Tesseract not available: no data for {language}"
            )));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedWorker {
            text: self.text.clone(),
            confidence: self.confidence,
        }))
    }
}

pub fn test_config(api_keys: &[&str], storage_dir: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_keys: api_keys.iter().filter_map(|k| ApiKey::parse(k)).collect(),
            max_body_bytes: 16 * 1024 * 1024,
        },
        database: DatabaseConfig {
            enabled: true,
            url: format!(
                "file:{}",
                storage_dir.path().join("ocrbox_test.db").display()
            ),
            auth_token: None,
            local_path: None,
        },
        storage: StorageConfig {
            backend: StorageBackendKind::Local,
            local_dir: storage_dir.path().join("uploads").display().to_string(),
            public_url: "http://files.test/files".to_string(),
            http_url: None,
            http_token: None,
            timeout_secs: 5,
        },
        ocr: OcrConfig::default(),
    }
}

/// A small real PNG with some dark strokes on a white background.
pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        if (x / 4 + y / 4) % 3 == 0 {
            Rgb([20u8, 20, 20])
        } else {
            Rgb([250u8, 250, 250])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api/v1{}", self.addr, path)
    }
}

/// Build state from the given pieces and serve it on an ephemeral port.
pub async fn spawn_app(
    config: Config,
    factory: Arc<ScriptedFactory>,
    storage: Arc<dyn ObjectStorage>,
    db: Option<Arc<dyn DatabaseBackend>>,
) -> TestApp {
    init_test_logger();

    let db = match db {
        Some(db) => db,
        None => open_backend(&config.database)
            .await
            .expect("Failed to open result store"),
    };
    let engines = Arc::new(EngineRegistry::new(
        factory,
        config.ocr.default_language.clone(),
    ));
    let state = AppState::new(config, db, engines, storage);
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp { addr, state }
}
