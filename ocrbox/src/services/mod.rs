mod ocr;

pub use ocr::{history_limit, OcrService, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
