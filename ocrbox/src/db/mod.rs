pub mod backends;
mod connection;
pub mod repository;
pub(crate) mod schema;
pub mod traits;

use std::sync::Arc;

pub use backends::libsql::LibSqlBackend;
pub use backends::null::NullResultStore;
pub use connection::Database;
pub use traits::*;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Open the configured result store, or the null store when persistence is off.
pub async fn open_backend(config: &DatabaseConfig) -> Result<Arc<dyn DatabaseBackend>> {
    if !config.enabled {
        tracing::warn!("DATABASE_ENABLED=false: OCR results will not be persisted");
        return Ok(Arc::new(NullResultStore));
    }

    let db = Database::new(config).await?;
    Ok(Arc::new(LibSqlBackend::new(db)))
}
