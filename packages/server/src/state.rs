use std::sync::Arc;

use common::storage::{ObjectStore, StorageGateway};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::realtime::{Broadcaster, ConnectionHub};
use crate::utils::jwt::TokenService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub storage: StorageGateway,
    pub hub: Arc<ConnectionHub>,
    pub broadcaster: Broadcaster,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let storage = StorageGateway::new(store)
            .with_ttls(config.storage.upload_ttl(), config.storage.download_ttl());
        let hub = Arc::new(ConnectionHub::new());
        let broadcaster = Broadcaster::new(db.clone(), storage.clone(), hub.clone());

        Self {
            tokens: TokenService::new(&config.auth),
            config: Arc::new(config),
            db,
            storage,
            hub,
            broadcaster,
            mailer,
        }
    }
}
