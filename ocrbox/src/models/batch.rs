use serde::{Deserialize, Serialize};

/// One still-encoded image of a batch request. Decoding happens per item so a
/// bad payload only fails its own entry.
#[derive(Debug, Clone)]
pub struct BatchImage {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub language: Option<String>,
    pub image_data: String,
}

/// A batch item that was recognized, uploaded and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemSuccess {
    pub file_name: String,
    pub text: String,
    pub confidence: u32,
    pub processing_time_ms: u64,
    pub image_url: String,
    pub result_id: String,
    pub success: bool,
}

/// A batch item that failed at some stage; `error` says which and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub file_name: String,
    pub error: String,
}

impl BatchItemError {
    pub fn new(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            error: error.into(),
        }
    }
}

pub type BatchItemResult = std::result::Result<BatchItemSuccess, BatchItemError>;

/// Aggregate of a batch run.
///
/// Always `results.len() == total_processed`, `errors.len() == total_failed`
/// and `total_processed + total_failed` equals the number of input items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemSuccess>,
    pub errors: Vec<BatchItemError>,
    pub total_processed: usize,
    pub total_failed: usize,
}

impl BatchOutcome {
    pub fn push(mut self, item: BatchItemResult) -> Self {
        match item {
            Ok(success) => {
                self.results.push(success);
                self.total_processed += 1;
            }
            Err(failure) => {
                self.errors.push(failure);
                self.total_failed += 1;
            }
        }
        self
    }

    pub fn total(&self) -> usize {
        self.total_processed + self.total_failed
    }
}

impl FromIterator<BatchItemResult> for BatchOutcome {
    fn from_iter<I: IntoIterator<Item = BatchItemResult>>(iter: I) -> Self {
        iter.into_iter().fold(BatchOutcome::default(), BatchOutcome::push)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(name: &str) -> BatchItemResult {
        Ok(BatchItemSuccess {
            file_name: name.to_string(),
            text: "text".to_string(),
            confidence: 90,
            processing_time_ms: 5,
            image_url: format!("http://files/{name}"),
            result_id: format!("id-{name}"),
            success: true,
        })
    }

    #[test]
    fn test_empty_batch_has_zero_totals() {
        let outcome: BatchOutcome = Vec::<BatchItemResult>::new().into_iter().collect();
        assert!(outcome.results.is_empty());
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.total_processed, 0);
        assert_eq!(outcome.total_failed, 0);
    }

    #[test]
    fn test_collect_preserves_input_order_and_totals() {
        let items = vec![
            success("a.png"),
            Err(BatchItemError::new("b.gif", "Unsupported file type")),
            success("c.png"),
            Err(BatchItemError::new("d.png", "upload failed")),
        ];
        let outcome: BatchOutcome = items.into_iter().collect();

        assert_eq!(outcome.total_processed, 2);
        assert_eq!(outcome.total_failed, 2);
        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.results[0].file_name, "a.png");
        assert_eq!(outcome.results[1].file_name, "c.png");
        assert_eq!(outcome.errors[0].file_name, "b.gif");
        assert_eq!(outcome.errors[1].file_name, "d.png");
    }
}
