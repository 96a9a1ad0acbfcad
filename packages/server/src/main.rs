use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::{InMemoryObjectStore, ObjectStore, S3ObjectStore, S3Settings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pastille_server::config::{AppConfig, StorageBackend, StorageConfig};
use pastille_server::mailer::LogMailer;
use pastille_server::state::AppState;
use pastille_server::{build_router, database, seed};

fn object_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::S3 => {
            let store = S3ObjectStore::new(&S3Settings {
                bucket: config.bucket.clone(),
                region: config.region.clone(),
                endpoint: config.endpoint.clone(),
                access_key: config.access_key.clone(),
                secret_key: config.secret_key.clone(),
            })?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory object store; uploaded files are lost on restart");
            Ok(Arc::new(InMemoryObjectStore::new(config.bucket.clone())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database).await?;
    info!("Database schema synchronized");

    seed::ensure_indexes(&db).await?;
    if config.seed.demo_users {
        seed::seed_demo_users(&db).await?;
    }

    if config.backoffice.api_key.is_empty() {
        warn!("backoffice.api_key is empty; back-office routes will refuse every request");
    }

    let store = object_store(&config.storage)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(config, db, store, Arc::new(LogMailer));
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
