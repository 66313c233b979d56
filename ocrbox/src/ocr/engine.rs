use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{OcrboxError, Result};

/// Raw output of a recognition backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Fraction in `0.0..=1.0`; `None` when the backend does not score its output.
    pub confidence: Option<f32>,
}

/// A constructed, ready-to-use recognition worker bound to one language.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<Recognition>;

    async fn terminate(&self) -> Result<()> {
        Ok(())
    }
}

/// Builds recognition workers on demand.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    fn name(&self) -> &str;

    async fn create(&self, language: &str) -> Result<Arc<dyn RecognitionBackend>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineState::Initializing,
            2 => EngineState::Ready,
            _ => EngineState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EngineState::Uninitialized => 0,
            EngineState::Initializing => 1,
            EngineState::Ready => 2,
        }
    }
}

/// Lazily initialized recognition engine for a single language.
///
/// The worker is built on first use. Concurrent first callers queue on the
/// same lock, so exactly one construction happens. A failed construction
/// leaves the engine uninitialized and the next call tries again. Calls to
/// [`OcrEngine::recognize`] are serialized against the one worker.
pub struct OcrEngine {
    language: String,
    factory: Arc<dyn BackendFactory>,
    worker: Mutex<Option<Arc<dyn RecognitionBackend>>>,
    // Mirrors the worker slot so status reads never wait on a running recognition.
    state: AtomicU8,
}

impl OcrEngine {
    pub fn new(factory: Arc<dyn BackendFactory>, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            factory,
            worker: Mutex::new(None),
            state: AtomicU8::new(EngineState::Uninitialized.as_u8()),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn status(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub async fn recognize(&self, image: &[u8]) -> Result<Recognition> {
        let mut slot = self.worker.lock().await;
        let worker = self.ready_worker(&mut slot).await?;
        worker.recognize(image).await
    }

    /// Release the worker. Failures are logged; the engine always ends up
    /// uninitialized and the next recognition builds a fresh worker.
    pub async fn terminate(&self) {
        let mut slot = self.worker.lock().await;
        if let Some(worker) = slot.take() {
            if let Err(e) = worker.terminate().await {
                warn!(language = %self.language, error = %e, "Failed to terminate OCR worker");
            } else {
                info!(language = %self.language, "OCR worker terminated");
            }
        }
        self.set_state(EngineState::Uninitialized);
    }

    async fn ready_worker(
        &self,
        slot: &mut Option<Arc<dyn RecognitionBackend>>,
    ) -> Result<Arc<dyn RecognitionBackend>> {
        if let Some(worker) = slot.as_ref() {
            return Ok(Arc::clone(worker));
        }

        self.set_state(EngineState::Initializing);
        debug!(language = %self.language, backend = self.factory.name(), "Initializing OCR worker");

        match self.factory.create(&self.language).await {
            Ok(worker) => {
                *slot = Some(Arc::clone(&worker));
                self.set_state(EngineState::Ready);
                info!(language = %self.language, backend = self.factory.name(), "OCR worker ready");
                Ok(worker)
            }
            Err(e) => {
                self.set_state(EngineState::Uninitialized);
                warn!(language = %self.language, error = %e, "OCR worker initialization failed");
                Err(OcrboxError::OcrInit(format!(
                    "Failed to initialize OCR worker: {e}"
                )))
            }
        }
    }

    fn set_state(&self, state: EngineState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub language: String,
    pub state: EngineState,
}

/// Upper bound on registered languages; the default language is always admitted.
pub const MAX_ENGINES: usize = 16;

/// One [`OcrEngine`] per requested language, created on first request.
pub struct EngineRegistry {
    factory: Arc<dyn BackendFactory>,
    default_language: String,
    engines: RwLock<HashMap<String, Arc<OcrEngine>>>,
}

impl EngineRegistry {
    pub fn new(factory: Arc<dyn BackendFactory>, default_language: impl Into<String>) -> Self {
        Self {
            factory,
            default_language: default_language.into(),
            engines: RwLock::new(HashMap::new()),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.factory.name()
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Resolve an optional, possibly blank language to the code actually used.
    pub fn resolve_language(&self, language: Option<&str>) -> Result<String> {
        match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(language) => {
                validate_language(language)?;
                Ok(language.to_string())
            }
            None => Ok(self.default_language.clone()),
        }
    }

    pub async fn engine(&self, language: &str) -> Result<Arc<OcrEngine>> {
        validate_language(language)?;

        if let Some(engine) = self.engines.read().await.get(language) {
            return Ok(Arc::clone(engine));
        }

        let mut engines = self.engines.write().await;
        if let Some(engine) = engines.get(language) {
            return Ok(Arc::clone(engine));
        }
        if engines.len() >= MAX_ENGINES && language != self.default_language {
            return Err(OcrboxError::OcrUnavailable(format!(
                "{MAX_ENGINES} OCR languages already loaded, cannot add {language}"
            )));
        }

        let engine = Arc::new(OcrEngine::new(Arc::clone(&self.factory), language));
        engines.insert(language.to_string(), Arc::clone(&engine));
        Ok(engine)
    }

    /// Recognize with the language's engine. An engine whose construction
    /// failed is unregistered, so unknown languages do not pile up.
    pub async fn recognize(&self, language: &str, image: &[u8]) -> Result<Recognition> {
        let engine = self.engine(language).await?;
        let result = engine.recognize(image).await;
        if matches!(result, Err(OcrboxError::OcrInit(_))) {
            self.evict_if_uninitialized(&engine).await;
        }
        result
    }

    async fn evict_if_uninitialized(&self, engine: &Arc<OcrEngine>) {
        let mut engines = self.engines.write().await;
        let registered = engines
            .get(engine.language())
            .is_some_and(|current| Arc::ptr_eq(current, engine));
        // Another caller may already be retrying the construction.
        if registered && engine.status() == EngineState::Uninitialized {
            engines.remove(engine.language());
            debug!(language = %engine.language(), "Unregistered OCR engine after failed initialization");
        }
    }

    pub async fn statuses(&self) -> Vec<EngineStatus> {
        let engines = self.engines.read().await;
        let mut statuses: Vec<EngineStatus> = engines
            .values()
            .map(|engine| EngineStatus {
                language: engine.language().to_string(),
                state: engine.status(),
            })
            .collect();
        statuses.sort_by(|a, b| a.language.cmp(&b.language));
        statuses
    }

    /// Terminate every engine. Engines stay registered and re-initialize on use.
    pub async fn shutdown(&self) {
        let engines: Vec<Arc<OcrEngine>> = self.engines.read().await.values().cloned().collect();
        for engine in engines {
            engine.terminate().await;
        }
    }
}

/// Tesseract-style codes: `eng`, `chi_sim`, `eng+deu`.
pub fn validate_language(language: &str) -> Result<()> {
    let well_formed = !language.is_empty()
        && language.len() <= 32
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+');

    if well_formed {
        Ok(())
    } else {
        Err(OcrboxError::Validation(format!(
            "Invalid language code: {language}"
        )))
    }
}
