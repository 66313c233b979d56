use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

use super::OcrOutcome;

/// Persisted record of one successfully processed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResultRecord {
    pub id: String,
    pub user_id: String,
    pub image_file_name: String,
    pub image_url: String,
    pub extracted_text: String,
    pub confidence: u32,
    pub language: String,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OcrResultRecord {
    pub fn from_outcome(
        user_id: &str,
        image_file_name: &str,
        image_url: &str,
        outcome: &OcrOutcome,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: nanoid!(),
            user_id: user_id.to_string(),
            image_file_name: image_file_name.to_string(),
            image_url: image_url.to_string(),
            extracted_text: outcome.text.clone(),
            confidence: outcome.confidence,
            language: outcome.language.clone(),
            processing_time_ms: outcome.processing_time_ms,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_copies_outcome_fields() {
        let outcome = OcrOutcome::succeeded("hello".to_string(), 91, "deu", 40);
        let record = OcrResultRecord::from_outcome("u1", "scan.png", "http://x/scan.png", &outcome);

        assert_eq!(record.id.len(), 21);
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.extracted_text, "hello");
        assert_eq!(record.confidence, 91);
        assert_eq!(record.language, "deu");
        assert_eq!(record.processing_time_ms, 40);
        assert_eq!(record.created_at, record.updated_at);
    }
}
