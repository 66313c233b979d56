use async_trait::async_trait;

use crate::db::traits::{DatabaseBackend, ResultStore};
use crate::error::Result;
use crate::models::OcrResultRecord;

/// Stand-in when persistence is disabled: nothing is stored, nothing is found.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResultStore;

#[async_trait]
impl ResultStore for NullResultStore {
    async fn save(&self, _record: &OcrResultRecord) -> Result<Option<OcrResultRecord>> {
        Ok(None)
    }
    async fn get_for_user(&self, _id: &str, _user_id: &str) -> Result<Option<OcrResultRecord>> {
        Ok(None)
    }
    async fn list_by_user(&self, _user_id: &str, _limit: u32) -> Result<Vec<OcrResultRecord>> {
        Ok(Vec::new())
    }
    async fn delete(&self, _id: &str, _user_id: &str) -> Result<bool> {
        Ok(false)
    }
}

#[async_trait]
impl DatabaseBackend for NullResultStore {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn sync(&self) -> Result<()> {
        Ok(())
    }
}
