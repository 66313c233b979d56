use crate::db::connection::Database;
use crate::db::repository::OcrResultRepository;
use crate::db::traits::{DatabaseBackend, ResultStore};
use crate::error::Result;
use crate::models::OcrResultRecord;
use async_trait::async_trait;

pub struct LibSqlBackend {
    db: Database,
}

impl LibSqlBackend {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultStore for LibSqlBackend {
    async fn save(&self, record: &OcrResultRecord) -> Result<Option<OcrResultRecord>> {
        let conn = self.db.connect()?;
        OcrResultRepository::create(&conn, record).await?;
        Ok(Some(record.clone()))
    }
    async fn get_for_user(&self, id: &str, user_id: &str) -> Result<Option<OcrResultRecord>> {
        let conn = self.db.connect()?;
        OcrResultRepository::get_by_id_for_user(&conn, id, user_id).await
    }
    async fn list_by_user(&self, user_id: &str, limit: u32) -> Result<Vec<OcrResultRecord>> {
        let conn = self.db.connect()?;
        OcrResultRepository::list_by_user(&conn, user_id, limit).await
    }
    async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        OcrResultRepository::delete_for_user(&conn, id, user_id).await
    }
}

#[async_trait]
impl DatabaseBackend for LibSqlBackend {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn sync(&self) -> Result<()> {
        self.db.sync().await
    }
}
