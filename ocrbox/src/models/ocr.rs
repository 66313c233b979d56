use serde::{Deserialize, Serialize};

/// A single image submitted for recognition. Built per call, never persisted.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image_bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub language: String,
}

impl OcrRequest {
    pub fn new(
        image_bytes: Vec<u8>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            image_bytes,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            language: language.into(),
        }
    }
}

/// Result of running one image through optimize + recognize.
///
/// `success == false` carries the failure message in `error`; `text` is then
/// empty and `confidence` is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOutcome {
    pub text: String,
    pub confidence: u32,
    pub language: String,
    pub processing_time_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

impl OcrOutcome {
    pub fn succeeded(
        text: String,
        confidence: u32,
        language: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            text,
            confidence: confidence.min(100),
            language: language.into(),
            processing_time_ms,
            success: true,
            error: None,
        }
    }

    pub fn failed(
        error: impl Into<String>,
        language: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            text: String::new(),
            confidence: 0,
            language: language.into(),
            processing_time_ms,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A single image that went through the full pipeline and was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub outcome: OcrOutcome,
    pub image_url: String,
    pub result_id: String,
}

/// Map an engine's fractional confidence (0.0-1.0) to an integer percentage.
///
/// Rounds half away from zero, so `0.876` becomes `88` and `0.005` becomes `1`.
/// Missing, negative or non-finite scores map to `0`.
pub fn confidence_percent(fraction: Option<f32>) -> u32 {
    match fraction {
        Some(f) if f.is_finite() && f > 0.0 => {
            let percent = (f64::from(f) * 100.0).round();
            percent.min(100.0) as u32
        }
        _ => 0,
    }
}
