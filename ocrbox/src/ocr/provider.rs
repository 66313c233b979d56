use std::sync::Arc;

use async_trait::async_trait;
use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{parse_ocr_model, OcrConfig};
use crate::error::{OcrboxError, Result};

use super::api::VisionApiFactory;
use super::engine::{BackendFactory, Recognition, RecognitionBackend};

/// Pick the recognition backend named by `OCR_MODEL`.
pub fn build_factory(config: &OcrConfig) -> Arc<dyn BackendFactory> {
    let (provider, model) = parse_ocr_model(&config.model);

    if provider.eq_ignore_ascii_case("openai") {
        info!(model, "Using vision API OCR backend");
        Arc::new(VisionApiFactory::new(model, config))
    } else {
        info!(data_path = ?config.data_path, "Using Tesseract OCR backend");
        Arc::new(TesseractFactory::new(config.data_path.clone()))
    }
}

pub struct TesseractFactory {
    data_path: Option<String>,
}

impl TesseractFactory {
    pub fn new(data_path: Option<String>) -> Self {
        Self { data_path }
    }
}

#[async_trait]
impl BackendFactory for TesseractFactory {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn create(&self, language: &str) -> Result<Arc<dyn RecognitionBackend>> {
        let data_path = self.data_path.clone();
        let lang = language.to_string();

        // Loading traineddata reads large files from disk.
        let tesseract = tokio::task::spawn_blocking(move || {
            LepTess::new(data_path.as_deref(), &lang).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| OcrboxError::OcrInit(format!("Tesseract init task panicked: {e}")))?
        .map_err(|e| OcrboxError::OcrInit(format!("Tesseract not available: {e}")))?;

        Ok(Arc::new(TesseractBackend {
            tesseract: Arc::new(Mutex::new(tesseract)),
        }))
    }
}

pub struct TesseractBackend {
    tesseract: Arc<Mutex<LepTess>>,
}

#[async_trait]
impl RecognitionBackend for TesseractBackend {
    async fn recognize(&self, image: &[u8]) -> Result<Recognition> {
        let bytes = image.to_vec();
        let tesseract = Arc::clone(&self.tesseract);

        let (text, mean_conf) = tokio::task::spawn_blocking(move || {
            let mut lt = tesseract.blocking_lock();
            lt.set_image_from_mem(&bytes)
                .map_err(|e| OcrboxError::Ocr(format!("Failed to set image: {e}")))?;
            let text = lt
                .get_utf8_text()
                .map_err(|e| OcrboxError::Ocr(format!("Failed to extract text: {e}")))?;
            Ok::<_, OcrboxError>((text, lt.mean_text_conf()))
        })
        .await
        .map_err(|e| OcrboxError::Ocr(format!("OCR task panicked: {e}")))??;

        Ok(Recognition {
            text: text.trim().to_string(),
            confidence: Some(mean_conf as f32 / 100.0),
        })
    }
}
