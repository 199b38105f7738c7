//! # Passkey Admin Server
//!
//! Entry point: logging, configuration, database, background cleanup, HTTP
//! server. All application logic lives in the library crate.

use passkey_admin::config::Config;
use passkey_admin::db::challenges;
use passkey_admin::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired challenge rows are swept.
const CHALLENGE_CLEANUP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

/// Main application entry point
///
/// 1. Set up logging (`RUST_LOG` overrides the default filter)
/// 2. Load and validate configuration; refuse to start if incomplete
/// 3. Open the database and run migrations
/// 4. Start the expired-challenge sweeper
/// 5. Serve until Ctrl-C, then close the database
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,passkey_admin=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let bind_addr = config.bind_address();
    let app_state = AppState::new(config);

    // Connect now so a bad DATABASE_URL fails at startup, not on first login
    app_state.db.pool().await?;
    tracing::info!("Application state initialized");

    // Challenges expire on their own (take() ignores stale rows); this only
    // keeps abandoned ceremonies from piling up.
    let cleanup_db = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHALLENGE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            tracing::debug!("Running challenge cleanup task");
            let result = match cleanup_db.pool().await {
                Ok(pool) => challenges::cleanup_expired(pool).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Expired challenges removed"),
                Err(e) => tracing::error!("Challenge cleanup failed: {:?}", e),
            }
        }
    });

    let db = app_state.db.clone();
    let app = passkey_admin::build_router(app_state);

    tracing::info!("Starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
