use std::sync::Arc;

use crate::config::Config;
use crate::db::DatabaseBackend;
use crate::ocr::EngineRegistry;
use crate::services::OcrService;
use crate::storage::ObjectStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseBackend>,
    pub ocr: Arc<OcrService>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Arc<dyn DatabaseBackend>,
        engines: Arc<EngineRegistry>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let config = Arc::new(config);
        let ocr = Arc::new(OcrService::new(engines, storage, db.clone(), &config.ocr));

        Self { config, db, ocr }
    }
}
