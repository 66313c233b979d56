use async_trait::async_trait;

use crate::error::Result;
use crate::models::OcrResultRecord;

/// Owner-scoped persistence of OCR results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Returns the stored record, or `None` when no store is available.
    async fn save(&self, record: &OcrResultRecord) -> Result<Option<OcrResultRecord>>;

    async fn get_for_user(&self, id: &str, user_id: &str) -> Result<Option<OcrResultRecord>>;

    /// Newest first, at most `limit` records.
    async fn list_by_user(&self, user_id: &str, limit: u32) -> Result<Vec<OcrResultRecord>>;

    /// `true` when a record owned by `user_id` was removed.
    async fn delete(&self, id: &str, user_id: &str) -> Result<bool>;
}

/// Composite trait for a complete database backend.
#[async_trait]
pub trait DatabaseBackend: ResultStore {
    fn name(&self) -> &str;

    /// Sync with remote (e.g. Turso replication). No-op for local-only backends.
    async fn sync(&self) -> Result<()>;
}
