//! OCR (Optical Character Recognition) Module
//!
//! Everything between raw image bytes and extracted text:
//!
//! - `encoding`: base64 / data-URL decoding and MIME resolution
//! - `validation`: size and MIME policy, checked before any expensive work
//! - `preprocessing`: best-effort downscale + grayscale
//! - `engine`: lazily initialized recognition engines, one per language
//! - `provider`: local Tesseract backend and backend selection
//! - `api`: OpenAI-compatible vision backend
//!
//! # Configuration
//!
//! Backend selection follows `OcrConfig::model`:
//! - `local/tesseract` (default): Tesseract via leptess, `data_path` for tessdata
//! - `openai/<model>`: vision chat endpoint at `base_url` with `api_key`
//!
//! # Usage
//!
//! ```rust,ignore
//! let registry = EngineRegistry::new(build_factory(&config.ocr), "eng");
//! let recognition = registry.recognize("eng", &image_bytes).await?;
//! ```

mod api;
mod encoding;
mod engine;
mod preprocessing;
mod provider;
mod validation;

pub use api::{VisionApiBackend, VisionApiFactory};
pub use encoding::{decode_image_data, resolve_mime_type, DecodedImage};
pub use engine::{
    validate_language, BackendFactory, EngineRegistry, EngineState, EngineStatus, OcrEngine,
    Recognition, RecognitionBackend, MAX_ENGINES,
};
pub use preprocessing::{optimize_image, DEFAULT_MAX_DIMENSION};
pub use provider::{build_factory, TesseractBackend, TesseractFactory};
pub use validation::{
    is_supported_mime_type, validate_image, ImageValidation, ALLOWED_MIME_TYPES,
    DEFAULT_MAX_FILE_SIZE,
};
