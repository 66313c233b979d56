mod batch;
mod ocr;
mod ocr_result;

pub use batch::*;
pub use ocr::*;
pub use ocr_result::*;
