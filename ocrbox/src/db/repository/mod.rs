mod ocr_results;

pub use ocr_results::OcrResultRepository;
