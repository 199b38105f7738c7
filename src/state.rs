//! # Application State
//!
//! Resources shared by every request handler. Axum clones the state per
//! request, which is cheap: the database handle and config sit behind `Arc`s
//! and the session codec is a small key schedule.

use crate::config::Config;
use crate::db::Database;
use crate::session::SessionCodec;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// Lazily opened SQLite pool (see `db::Database`)
    pub db: Database,

    pub config: Arc<Config>,

    /// Signs and verifies `admin-session` tokens
    pub sessions: SessionCodec,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// Nothing is connected yet; call `db.pool()` to open the database
    /// eagerly.
    pub fn new(config: Config) -> Self {
        let db = Database::new(config.database_url.clone());
        Self::with_database(config, db)
    }

    pub fn with_database(config: Config, db: Database) -> Self {
        let sessions = SessionCodec::new(config.cookie_secret.as_bytes(), config.session_ttl_secs);

        AppState {
            db,
            config: Arc::new(config),
            sessions,
        }
    }
}
