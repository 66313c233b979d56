use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::OcrResultRecord;

pub struct OcrResultRepository;

// Fixed-width timestamps keep text ordering equal to time ordering.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl OcrResultRepository {
    pub async fn create(conn: &Connection, record: &OcrResultRecord) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO ocr_results (
                id, user_id, image_file_name, image_url, extracted_text,
                confidence, language, processing_time_ms, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record.id.clone(),
                record.user_id.clone(),
                record.image_file_name.clone(),
                record.image_url.clone(),
                record.extracted_text.clone(),
                i64::from(record.confidence),
                record.language.clone(),
                i64::try_from(record.processing_time_ms).unwrap_or(i64::MAX),
                timestamp(&record.created_at),
                timestamp(&record.updated_at),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get_by_id_for_user(
        conn: &Connection,
        id: &str,
        user_id: &str,
    ) -> Result<Option<OcrResultRecord>> {
        let mut rows = conn
            .query(
                "SELECT * FROM ocr_results WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_record(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Newest first.
    pub async fn list_by_user(
        conn: &Connection,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<OcrResultRecord>> {
        let mut rows = conn
            .query(
                r#"
                SELECT * FROM ocr_results
                WHERE user_id = ?1
                ORDER BY created_at DESC, rowid DESC
                LIMIT ?2
                "#,
                params![user_id, i64::from(limit)],
            )
            .await?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(Self::row_to_record(&row)?);
        }
        Ok(results)
    }

    pub async fn delete_for_user(conn: &Connection, id: &str, user_id: &str) -> Result<bool> {
        let rows_affected = conn
            .execute(
                "DELETE FROM ocr_results WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .await?;

        Ok(rows_affected > 0)
    }

    fn row_to_record(row: &libsql::Row) -> Result<OcrResultRecord> {
        Ok(OcrResultRecord {
            id: row.get(0)?,
            user_id: row.get(1)?,
            image_file_name: row.get(2)?,
            image_url: row.get(3)?,
            extracted_text: row.get(4)?,
            confidence: row.get::<i64>(5)?.clamp(0, 100) as u32,
            language: row.get(6)?,
            processing_time_ms: row.get::<i64>(7)?.max(0) as u64,
            created_at: DateTime::parse_from_rfc3339(&row.get::<String>(8)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&row.get::<String>(9)?)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
