//! Liveness probe for load balancers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// GET /health
///
/// 200 `{"status":"healthy","database":"up"}` when the credential store
/// answers, 503 with `"degraded"` otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database_up = match state.db.pool().await {
        Ok(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        Err(e) => {
            tracing::warn!("Health check could not open the database: {:?}", e);
            false
        }
    };

    let (status, label) = if database_up {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "passkey-admin",
            "database": if database_up { "up" } else { "down" },
        })),
    )
}
