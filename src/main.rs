//! Expense tracker auth server
//!
//! Loads configuration, connects to PostgreSQL, runs migrations and serves
//! the auth API.

use expense_auth::{build_router, config, AuthConfig, AuthService, PgUserStore, ServerConfig};

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real deployments set the environment directly
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting expense tracker auth server");
    config::log_environment_status();

    let auth_config = AuthConfig::from_env()?;
    auth_config.validate()?;
    let server_config = ServerConfig::from_env()?;

    tracing::info!(
        environment = auth_config.environment.as_str(),
        "Configuration loaded"
    );

    let pool = PgPoolOptions::new()
        .max_connections(server_config.max_connections)
        .connect(&server_config.database_url)
        .await?;
    tracing::info!("Connected to database");

    let store = PgUserStore::new(pool);
    store.run_migrations().await?;

    let auth = Arc::new(AuthService::new(Arc::new(store), auth_config));
    let app = build_router(auth);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
