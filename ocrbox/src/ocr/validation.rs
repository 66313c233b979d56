/// MIME types accepted for recognition.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/tiff"];

/// Default upload limit: 10 MB.
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const BYTES_PER_MB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageValidation {
    pub valid: bool,
    pub error: Option<String>,
}

impl ImageValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn rejected(error: String) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    pub fn into_result(self) -> crate::error::Result<()> {
        match self.error {
            Some(msg) if !self.valid => Err(crate::error::OcrboxError::Validation(msg)),
            _ => Ok(()),
        }
    }
}

/// Check an image against the size and MIME policy before any expensive work.
pub fn validate_image(bytes: &[u8], mime_type: &str, max_size_bytes: usize) -> ImageValidation {
    if bytes.len() > max_size_bytes {
        return ImageValidation::rejected(format!(
            "File size exceeds maximum of {}",
            format_megabytes(max_size_bytes)
        ));
    }

    if !is_supported_mime_type(mime_type) {
        return ImageValidation::rejected(format!(
            "Unsupported file type: {}. Allowed types: JPEG, PNG, WEBP, TIFF",
            mime_type.trim()
        ));
    }

    ImageValidation::ok()
}

/// Case-insensitive allow-list match that ignores parameters (`; charset=...`).
pub fn is_supported_mime_type(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&essence.as_str())
}

fn format_megabytes(bytes: usize) -> String {
    if bytes % BYTES_PER_MB == 0 {
        format!("{}MB", bytes / BYTES_PER_MB)
    } else {
        format!("{:.2}MB", bytes as f64 / BYTES_PER_MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_every_allowed_type_within_limit() {
        let bytes = vec![0u8; 1024];
        for mime in ALLOWED_MIME_TYPES {
            let result = validate_image(&bytes, mime, DEFAULT_MAX_FILE_SIZE);
            assert!(result.valid, "{mime} should be accepted");
            assert!(result.error.is_none());
        }
    }

    #[test]
    fn test_accepts_exactly_the_limit() {
        let bytes = vec![0u8; 2048];
        assert!(validate_image(&bytes, "image/png", 2048).valid);
    }

    #[test]
    fn test_rejects_oversized_with_limit_in_mb() {
        let bytes = vec![0u8; DEFAULT_MAX_FILE_SIZE + 1];
        let result = validate_image(&bytes, "image/png", DEFAULT_MAX_FILE_SIZE);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("10MB"));
    }

    #[test]
    fn test_fractional_limits_are_reported_in_mb() {
        let bytes = vec![0u8; 600 * 1024];
        let result = validate_image(&bytes, "image/png", 512 * 1024);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("0.50MB"));
    }

    #[test]
    fn test_rejects_types_outside_allow_list_regardless_of_size() {
        let bytes = vec![0u8; 16];
        for mime in ["image/gif", "image/bmp", "application/pdf", "text/plain", ""] {
            let result = validate_image(&bytes, mime, DEFAULT_MAX_FILE_SIZE);
            assert!(!result.valid, "{mime:?} should be rejected");
            assert!(result.error.unwrap().contains("Unsupported file type"));
        }
    }

    #[test]
    fn test_mime_matching_ignores_case_and_parameters() {
        assert!(is_supported_mime_type("IMAGE/PNG"));
        assert!(is_supported_mime_type("image/jpeg; charset=binary"));
        assert!(!is_supported_mime_type("image/jpg"));
    }

    #[test]
    fn test_into_result_maps_to_validation_error() {
        let err = validate_image(&[1], "image/gif", 10).into_result().unwrap_err();
        assert!(matches!(err, crate::error::OcrboxError::Validation(_)));
        assert!(validate_image(&[1], "image/png", 10).into_result().is_ok());
    }
}
