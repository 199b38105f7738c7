//! # Admin Handlers
//!
//! Endpoints that only make sense for a logged-in administrator.

use crate::db::credentials;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AdminSession;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// Describe the current admin session
///
/// ## Route
/// GET /api/admin/session
///
/// ## Response
/// ```json
/// { "subject": "root", "issued_at": 1705314600, "expires_at": 1705321800 }
/// ```
/// Without a valid session: `401 {"ok": false, "error": "unauthorized", ...}`.
pub async fn session_info(AdminSession(claims): AdminSession) -> Json<Value> {
    Json(json!({
        "subject": claims.sub,
        "issued_at": claims.iat,
        "expires_at": claims.exp,
    }))
}

/// Admin dashboard data
///
/// ## Route
/// GET /admin/dashboard (behind the route guard)
///
/// Shows the bound passkey's bookkeeping. Public key material is never
/// returned.
pub async fn dashboard(
    State(state): State<AppState>,
    AdminSession(claims): AdminSession,
) -> AppResult<Json<Value>> {
    let credential = credentials::find_admin(state.db.pool().await?)
        .await?
        .ok_or_else(|| AppError::Internal("Session exists without a credential".to_string()))?;

    Ok(Json(json!({
        "subject": claims.sub,
        "session_expires_at": claims.exp,
        "passkey": {
            "credential_id": credential.credential_id,
            "counter": credential.counter,
            "transports": credential.transport_hints(),
            "created_at": credential.created_at,
            "last_used_at": credential.last_used_at,
        }
    })))
}
