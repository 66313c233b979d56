use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{OcrboxError, Result};

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    /// MIME type declared by a `data:` URL prefix, if any.
    pub declared_mime_type: Option<String>,
}

/// Decode raw base64 or a `data:<mime>;base64,<payload>` URL.
pub fn decode_image_data(input: &str) -> Result<DecodedImage> {
    let input = input.trim();

    let (declared_mime_type, payload) = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                OcrboxError::Validation("Malformed data URL: missing ',' separator".to_string())
            })?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| {
                    OcrboxError::Validation("Data URL must be base64 encoded".to_string())
                })?
                .trim();
            let mime = (!mime.is_empty()).then(|| mime.to_string());
            (mime, payload)
        }
        None => (None, input),
    };

    // Clients sometimes wrap long base64 lines.
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes())?;

    if bytes.is_empty() {
        return Err(OcrboxError::Validation("Image data is empty".to_string()));
    }

    Ok(DecodedImage {
        bytes,
        declared_mime_type,
    })
}

/// Explicit MIME type first, then a data-URL type, then content sniffing.
pub fn resolve_mime_type(
    explicit: Option<&str>,
    declared: Option<&str>,
    bytes: &[u8],
) -> String {
    explicit
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .or_else(|| declared.map(str::trim).filter(|m| !m.is_empty()))
        .map(str::to_string)
        .or_else(|| infer::get(bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}
