use std::sync::Arc;

use anyhow::Context;
use common::storage::filesystem::FilesystemFileStore;
use tracing::{Level, info};

use server::config::AppConfig;
use server::database::init_db;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    info!("Database ready");

    let store = FilesystemFileStore::new(config.upload.dir.clone())
        .await
        .with_context(|| format!("Failed to open upload directory {:?}", config.upload.dir))?;
    info!("Storing uploads under {:?}", config.upload.dir);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = server::build_router(AppState::new(db, config, Arc::new(store)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
