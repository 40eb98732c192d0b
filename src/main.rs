//! kinocat service binary

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kinocat::blob::{BlobStore, FsBlobStore};
use kinocat::config::Config;
use kinocat::sse::SubscriberRegistry;
use kinocat::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting kinocat (movie catalog import) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    std::fs::create_dir_all(&config.data_dir)?;
    info!("Data directory: {}", config.data_dir.display());

    let db = kinocat::db::init_database_pool(&config.database_path()).await?;
    info!("Database connection established");

    let blob: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.blob_dir()).await?);

    // Heartbeat timer lives as long as the registry, i.e. the process.
    let registry = SubscriberRegistry::new(config.heartbeat_period());

    let state = AppState::new(db, blob, registry);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
