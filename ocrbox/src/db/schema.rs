use libsql::Connection;

use crate::error::Result;

pub async fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- OCR results, one row per successfully processed image
        CREATE TABLE IF NOT EXISTS ocr_results (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            image_file_name TEXT NOT NULL,
            image_url TEXT NOT NULL,
            extracted_text TEXT NOT NULL DEFAULT '',
            confidence INTEGER NOT NULL DEFAULT 0,
            language TEXT NOT NULL DEFAULT 'eng',
            processing_time_ms INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ocr_results_user_created
            ON ocr_results(user_id, created_at DESC);
        "#,
    )
    .await?;

    Ok(())
}
