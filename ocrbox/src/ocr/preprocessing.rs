use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use tracing::{debug, warn};

use crate::error::{OcrboxError, Result};

/// Default bound on the longest accepted width before downscaling.
pub const DEFAULT_MAX_DIMENSION: u32 = 4000;

/// Prepare image bytes for the recognition engine.
///
/// Images wider than `max_dimension` are scaled down to fit inside a
/// `max_dimension` square (aspect ratio kept, never enlarged), and every
/// image is converted to single-channel grayscale and encoded as PNG.
///
/// Optimization is best-effort: if the image cannot be decoded or
/// re-encoded, a warning is logged and the original bytes come back
/// unchanged.
pub fn optimize_image(bytes: &[u8], max_dimension: u32) -> Vec<u8> {
    match try_optimize(bytes, max_dimension) {
        Ok(optimized) => optimized,
        Err(e) => {
            warn!(error = %e, size = bytes.len(), "Image optimization failed, using original bytes");
            bytes.to_vec()
        }
    }
}

fn try_optimize(bytes: &[u8], max_dimension: u32) -> Result<Vec<u8>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| OcrboxError::Processing(format!("Failed to read image: {e}")))?;
    let img = reader
        .decode()
        .map_err(|e| OcrboxError::Processing(format!("Failed to decode image: {e}")))?;

    let img = resize_if_needed(img, max_dimension);
    let img = DynamicImage::ImageLuma8(img.to_luma8());

    encode_png(&img)
}

/// Downscale when the width exceeds `max_dim`, fitting inside `max_dim` x `max_dim`.
fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim {
        return img;
    }

    debug!(width, height, max_dim, "Downscaling oversized image");
    // `resize` keeps the aspect ratio and fits within both bounds
    img.resize(max_dim, max_dim, image::imageops::FilterType::Lanczos3)
}

/// Lossless PNG for the engine whatever the source format.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| OcrboxError::Processing(format!("Failed to encode image: {e}")))?;
    Ok(output)
}
