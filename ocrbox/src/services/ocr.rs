use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::OcrConfig;
use crate::db::DatabaseBackend;
use crate::error::{OcrboxError, Result};
use crate::models::{
    confidence_percent, BatchImage, BatchItemError, BatchItemResult, BatchItemSuccess,
    BatchOutcome, OcrOutcome, OcrRequest, OcrResultRecord, ProcessedImage,
};
use crate::ocr::{
    decode_image_data, optimize_image, resolve_mime_type, validate_image, EngineRegistry,
    Recognition,
};
use crate::storage::{object_key, ObjectStorage, StoredObject};

pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Effective history page size: default 50, clamped to 1..=200.
pub fn history_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_file_size: usize,
    max_image_dimension: u32,
    max_batch_size: usize,
}

/// Runs images through validate -> optimize -> recognize -> upload -> persist.
pub struct OcrService {
    engines: Arc<EngineRegistry>,
    storage: Arc<dyn ObjectStorage>,
    db: Arc<dyn DatabaseBackend>,
    limits: Limits,
}

impl OcrService {
    pub fn new(
        engines: Arc<EngineRegistry>,
        storage: Arc<dyn ObjectStorage>,
        db: Arc<dyn DatabaseBackend>,
        config: &OcrConfig,
    ) -> Self {
        Self {
            engines,
            storage,
            db,
            limits: Limits {
                max_file_size: config.max_file_size,
                max_image_dimension: config.max_image_dimension,
                max_batch_size: config.max_batch_size,
            },
        }
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn storage_name(&self) -> &str {
        self.storage.name()
    }

    /// Optimize and recognize one already validated image.
    ///
    /// Never fails: engine and recognition errors come back as an outcome with
    /// `success == false`. `processing_time_ms` covers the whole call.
    pub async fn process_one(&self, request: &OcrRequest) -> OcrOutcome {
        let (result, elapsed_ms) = self.recognize(request).await;
        match result {
            Ok(recognition) => OcrOutcome::succeeded(
                recognition.text,
                confidence_percent(recognition.confidence),
                &request.language,
                elapsed_ms,
            ),
            Err(e) => OcrOutcome::failed(e.to_string(), &request.language, elapsed_ms),
        }
    }

    /// Full single-image path. The first failing stage is returned as its error.
    pub async fn process_image(&self, user_id: &str, request: OcrRequest) -> Result<ProcessedImage> {
        validate_image(
            &request.image_bytes,
            &request.mime_type,
            self.limits.max_file_size,
        )
        .into_result()?;

        let (result, elapsed_ms) = self.recognize(&request).await;
        let recognition = result?;
        let outcome = OcrOutcome::succeeded(
            recognition.text,
            confidence_percent(recognition.confidence),
            &request.language,
            elapsed_ms,
        );

        let (stored, record) = self.upload_and_persist(user_id, &request, &outcome).await?;

        info!(
            user_id,
            file_name = %request.file_name,
            language = %request.language,
            confidence = outcome.confidence,
            elapsed_ms,
            "Processed image"
        );

        Ok(ProcessedImage {
            outcome,
            image_url: stored.url,
            result_id: record.id,
        })
    }

    /// Process every item in order. Per-item failures land in `errors`; only a
    /// batch over the size limit fails as a whole.
    pub async fn process_batch(
        &self,
        user_id: &str,
        items: Vec<BatchImage>,
    ) -> Result<BatchOutcome> {
        if items.len() > self.limits.max_batch_size {
            return Err(OcrboxError::Validation(format!(
                "Batch contains {} images; the maximum is {}",
                items.len(),
                self.limits.max_batch_size
            )));
        }

        let mut item_results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            debug!(user_id, index, file_name = %item.file_name, "Processing batch item");
            let result = self.process_batch_item(user_id, item).await;
            if let Err(failure) = &result {
                warn!(user_id, index, file_name = %failure.file_name, error = %failure.error, "Batch item failed");
            }
            item_results.push(result);
        }

        let outcome: BatchOutcome = item_results.into_iter().collect();
        info!(
            user_id,
            total = outcome.total(),
            processed = outcome.total_processed,
            failed = outcome.total_failed,
            "Processed batch"
        );
        Ok(outcome)
    }

    pub async fn history(&self, user_id: &str, limit: Option<u32>) -> Result<Vec<OcrResultRecord>> {
        self.db
            .list_by_user(user_id, history_limit(limit))
            .await
    }

    pub async fn get_result(&self, user_id: &str, id: &str) -> Result<OcrResultRecord> {
        self.db
            .get_for_user(id, user_id)
            .await?
            .ok_or_else(|| OcrboxError::NotFound(format!("OCR result {id} not found")))
    }

    /// `true` when a record owned by the user was removed.
    pub async fn delete_result(&self, user_id: &str, id: &str) -> Result<bool> {
        let deleted = self.db.delete(id, user_id).await?;
        if deleted {
            info!(user_id, result_id = id, "Deleted OCR result");
        }
        Ok(deleted)
    }

    pub async fn shutdown(&self) {
        self.engines.shutdown().await;
    }

    async fn process_batch_item(&self, user_id: &str, item: BatchImage) -> BatchItemResult {
        let fail = |error: String| BatchItemError::new(item.file_name.clone(), error);

        let decoded = decode_image_data(&item.image_data).map_err(|e| fail(e.to_string()))?;
        let language = self
            .engines
            .resolve_language(item.language.as_deref())
            .map_err(|e| fail(e.to_string()))?;
        let mime_type = resolve_mime_type(
            item.mime_type.as_deref(),
            decoded.declared_mime_type.as_deref(),
            &decoded.bytes,
        );
        let request = OcrRequest::new(decoded.bytes, item.file_name.clone(), mime_type, language);

        let validation = validate_image(
            &request.image_bytes,
            &request.mime_type,
            self.limits.max_file_size,
        );
        if let Some(error) = validation.error {
            return Err(fail(error));
        }

        let outcome = self.process_one(&request).await;
        if !outcome.success {
            return Err(fail(
                outcome
                    .error
                    .unwrap_or_else(|| "Text recognition failed".to_string()),
            ));
        }

        let (stored, record) = self
            .upload_and_persist(user_id, &request, &outcome)
            .await
            .map_err(|e| fail(e.to_string()))?;

        Ok(BatchItemSuccess {
            file_name: request.file_name,
            text: outcome.text,
            confidence: outcome.confidence,
            processing_time_ms: outcome.processing_time_ms,
            image_url: stored.url,
            result_id: record.id,
            success: true,
        })
    }

    async fn recognize(&self, request: &OcrRequest) -> (Result<Recognition>, u64) {
        let started = Instant::now();

        let optimized = self.optimize(&request.image_bytes).await;
        let result = self
            .engines
            .recognize(&request.language, &optimized)
            .await
            .map_err(|e| match e {
                OcrboxError::Ocr(_)
                | OcrboxError::OcrInit(_)
                | OcrboxError::OcrUnavailable(_)
                | OcrboxError::Validation(_) => e,
                other => OcrboxError::Ocr(other.to_string()),
            });

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        (result, elapsed_ms)
    }

    async fn optimize(&self, bytes: &[u8]) -> Vec<u8> {
        let input = bytes.to_vec();
        let max_dimension = self.limits.max_image_dimension;

        match tokio::task::spawn_blocking(move || optimize_image(&input, max_dimension)).await {
            Ok(optimized) => optimized,
            Err(e) => {
                warn!(error = %e, "Image optimization task failed, using original bytes");
                bytes.to_vec()
            }
        }
    }

    async fn upload_and_persist(
        &self,
        user_id: &str,
        request: &OcrRequest,
        outcome: &OcrOutcome,
    ) -> Result<(StoredObject, OcrResultRecord)> {
        let key = object_key(user_id, &request.file_name);
        let stored = self
            .storage
            .put(&key, &request.image_bytes, &request.mime_type)
            .await
            .map_err(|e| match e {
                OcrboxError::Storage(_) => e,
                other => OcrboxError::Storage(other.to_string()),
            })?;

        if stored.url.is_empty() {
            self.discard_upload(&stored.key).await;
            return Err(OcrboxError::Storage(
                "Storage returned an empty URL".to_string(),
            ));
        }

        let record = OcrResultRecord::from_outcome(user_id, &request.file_name, &stored.url, outcome);
        match self.db.save(&record).await {
            Ok(Some(saved)) => Ok((stored, saved)),
            Ok(None) => {
                self.discard_upload(&stored.key).await;
                Err(OcrboxError::Persistence(
                    "Result store is unavailable".to_string(),
                ))
            }
            Err(e) => {
                self.discard_upload(&stored.key).await;
                Err(OcrboxError::Persistence(format!(
                    "Failed to save OCR result: {e}"
                )))
            }
        }
    }

    async fn discard_upload(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            warn!(key, error = %e, "Failed to remove orphaned upload");
        }
    }
}
