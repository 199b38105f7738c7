//! # Error Handling
//!
//! Custom error types for the application and their conversion into HTTP
//! responses.
//!
//! Ceremony failures are coarse: every cryptographic or protocol
//! mismatch becomes `VerificationFailed`, and the detailed cause is only
//! logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// The first six variants are the outcomes a client can observe from the
/// passkey ceremonies and the session guard. The rest are infrastructure
/// failures that surface as a generic 500.
#[derive(Error, Debug)]
pub enum AppError {
    /// Registration attempted while a passkey is already bound (409)
    #[error("A passkey is already registered for this instance")]
    AlreadyInitialized,

    /// Authentication attempted before any passkey was registered (404)
    #[error("No passkey has been registered yet")]
    NotInitialized,

    /// The ceremony's challenge cookie is absent, expired or already used (400)
    #[error("The ceremony expired or was never started")]
    ChallengeMissing,

    /// The assertion names a credential we don't know (404)
    #[error("Unknown credential")]
    CredentialNotFound,

    /// Catch-all for attestation/assertion mismatches (400)
    #[error("Passkey verification failed")]
    VerificationFailed,

    /// Missing or invalid `admin-session` cookie (401)
    #[error("Not authenticated")]
    Unauthorized,

    /// Database errors (SQLx library errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed while opening the database
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// WebAuthn failures outside verification, e.g. an origin that doesn't
    /// match the RP ID or option generation failing
    #[error("WebAuthn error: {0}")]
    WebAuthn(#[from] webauthn_rs::prelude::WebauthnError),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal server errors (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code sent to the client.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AlreadyInitialized => "already-initialized",
            AppError::NotInitialized => "not-initialized",
            AppError::ChallengeMissing => "challenge-missing",
            AppError::CredentialNotFound => "credential-not-found",
            AppError::VerificationFailed => "verification-failed",
            AppError::Unauthorized => "unauthorized",
            _ => "internal-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AlreadyInitialized => StatusCode::CONFLICT,
            AppError::NotInitialized | AppError::CredentialNotFound => StatusCode::NOT_FOUND,
            AppError::ChallengeMissing | AppError::VerificationFailed => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response
///
/// Body format: `{ "ok": false, "error": "<code>", "message": "<text>" }`.
/// Infrastructure errors are logged in full and reported with a generic
/// message so storage or library internals never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Migration(e) => {
                tracing::error!("Migration error: {:?}", e);
                "Database error".to_string()
            }
            AppError::WebAuthn(e) => {
                tracing::error!("WebAuthn error: {:?}", e);
                "Passkey configuration error".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                "Serialization error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal server error".to_string()
            }
            // The ceremony/guard outcomes are safe to show as-is
            _ => self.to_string(),
        };

        let body = Json(json!({
            "ok": false,
            "error": self.code(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
