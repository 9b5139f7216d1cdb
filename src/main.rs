//! Bank Account Service - Main Application Entry Point
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations (or fall back to memory)
//! 3. Build HTTP router
//! 4. Start server on configured port

use std::sync::Arc;

use bank_account_service::{
    app, config, db,
    store::{InMemoryAccountStore, PgAccountStore, RandomAccountNumbers, SharedStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let numbers = Arc::new(RandomAccountNumbers);
    let store: SharedStore = match config.database_url.as_deref() {
        Some(database_url) => {
            let pool = db::create_pool(database_url, &config).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgAccountStore::new(pool, numbers, config.lock_timeout()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, accounts are kept in memory only");
            Arc::new(InMemoryAccountStore::new(numbers).with_lock_timeout(config.lock_timeout()))
        }
    };

    let app = app::router(store);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
