use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use saas_admin_api::config;
use saas_admin_api::database::{DatabaseManager, PgUserRepository};
use saas_admin_api::server::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    config.validate().map_err(anyhow::Error::msg)?;
    tracing::info!("Starting SaaS Admin API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    if config.database.run_migrations {
        // A database that is down at boot should not keep the server from
        // answering /health with 503
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            tracing::warn!("Skipping migrations: {}", e);
        }
    }

    let store = Arc::new(PgUserRepository::new(pool));
    let app = app(AppState::new(store, config.clone()));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("SaaS Admin API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
