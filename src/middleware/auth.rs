//! Admin session enforcement.
//!
//! Validation is purely cryptographic and time-based: no storage lookup
//! happens on any of these paths.

use crate::error::AppError;
use crate::session::cookies::SESSION_COOKIE;
use crate::session::{SessionClaims, SessionCodec};
use crate::state::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// Every path under this prefix requires a valid admin session.
pub const PROTECTED_PREFIX: &str = "/admin/";

/// Public entry point unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/admin";

/// True iff the jar holds a valid `admin-session` token.
///
/// This is the hook write actions on blog content call before doing
/// anything. It never errors: callers branch on `false`.
pub fn require_admin(jar: &CookieJar, sessions: &SessionCodec) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|cookie| sessions.validate(cookie.value()))
}

/// Route guard for `/admin/*`.
///
/// Unauthenticated requests are redirected to the login surface rather than
/// shown an error.
pub async fn guard_admin_routes(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path().starts_with(PROTECTED_PREFIX) && !require_admin(&jar, &state.sessions) {
        tracing::debug!(path = %request.uri().path(), "Redirecting unauthenticated admin request");
        return Redirect::temporary(LOGIN_PATH).into_response();
    }

    next.run(request).await
}

/// Extractor for API handlers that need the administrator: rejects with
/// `401 unauthorized` instead of redirecting.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        jar.get(SESSION_COOKIE)
            .and_then(|cookie| state.sessions.decode(cookie.value()))
            .map(AdminSession)
            .ok_or(AppError::Unauthorized)
    }
}
