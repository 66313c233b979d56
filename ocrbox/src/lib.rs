//! Ocrbox: a self-hostable OCR service.
//!
//! Images go through validate -> optimize -> recognize -> upload -> persist.
//! The HTTP surface lives in [`api`]; [`services::OcrService`] holds the
//! pipeline and can be driven directly.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod ocr;
pub mod services;
pub mod storage;

pub use error::{OcrboxError, Result};
