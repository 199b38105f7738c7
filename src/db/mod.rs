//! # Database Module
//!
//! - `models`: row types (`PasskeyCredential`, `StoredChallenge`) and `CredentialId`
//! - `credentials`: the single bound passkey
//! - `challenges`: in-flight ceremony state
//!
//! ## Connection lifecycle
//! `Database` is constructed once in `main` and shared through `AppState`.
//! The pool is opened lazily on first use; concurrent first callers wait on
//! the same initialization instead of racing to connect. `main` warms it at
//! startup and closes it on shutdown.

pub mod challenges;
pub mod credentials;
pub mod models;

use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Shared handle to the SQLite pool.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    url: String,
    pool: OnceCell<SqlitePool>,
}

impl Database {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url: url.into(),
                pool: OnceCell::new(),
            }),
        }
    }

    /// A private in-memory database, mostly for tests.
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// Get the pool, connecting and migrating on first use.
    pub async fn pool(&self) -> AppResult<&SqlitePool> {
        self.inner
            .pool
            .get_or_try_init(|| connect(&self.inner.url))
            .await
    }

    /// Close the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(pool) = self.inner.pool.get() {
            pool.close().await;
        }
    }
}

async fn connect(url: &str) -> AppResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    // Each connection to ":memory:" is its own database, so an in-memory
    // pool must stay on one connection that is never recycled.
    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database ready");

    Ok(pool)
}
