use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::qr_service::QrCache;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub qr: Arc<QrCache>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let qr = QrCache::new(config.qr_dir.clone(), &config.base_url);
        Self {
            pool,
            config: Arc::new(config),
            qr: Arc::new(qr),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
