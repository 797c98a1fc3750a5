use std::sync::Arc;

use common::storage::FileStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::ingest::{UploadPolicy, UploadService};
use crate::utils::jwt::JwtKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub store: Arc<dyn FileStore>,
    pub policy: Arc<UploadPolicy>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig, store: Arc<dyn FileStore>) -> Self {
        let policy = Arc::new(UploadPolicy::from_config(&config.upload));
        let jwt = Arc::new(JwtKeys::new(config.auth.jwt_secret.as_bytes()));
        Self {
            db,
            config,
            store,
            policy,
            jwt,
        }
    }

    pub fn uploads(&self) -> UploadService<DatabaseConnection> {
        UploadService::new(self.db.clone(), self.store.clone(), self.policy.clone())
    }
}
