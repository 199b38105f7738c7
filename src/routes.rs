//! # Routing
//!
//! Builds the full application router. Kept out of `main` so tests can drive
//! it with `tower::ServiceExt::oneshot`.

use crate::config::Config;
use crate::handlers::admin::{dashboard, session_info};
use crate::handlers::auth::*;
use crate::handlers::health::health_check;
use crate::middleware::auth::guard_admin_routes;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/status", get(status))
        // Registration flow (one-time passkey setup)
        .route("/api/auth/register/options", post(register_options))
        .route("/api/auth/register/verify", post(register_verify))
        // Authentication flow (logging in with the passkey)
        .route("/api/auth/authenticate/options", post(authenticate_options))
        .route("/api/auth/authenticate/verify", post(authenticate_verify))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/session", get(session_info))
        .route("/admin/dashboard", get(dashboard))
        // Public entry point: passkey setup or login
        .route_service("/admin", ServeFile::new("static/admin.html"))
        .fallback_service(ServeDir::new("static"))
        // Applies to every route and the fallback; only acts on /admin/*
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            guard_admin_routes,
        ))
        .layer(TraceLayer::new_for_http());

    let app = match cors_layer(&state.config) {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.with_state(state)
}

/// Cookies only work cross-origin with credentials enabled, which in turn
/// requires naming the origin. Without a configured origin, no CORS.
fn cors_layer(config: &Config) -> Option<CorsLayer> {
    let origin = config.origin.as_deref()?;
    let origin = HeaderValue::from_str(origin.trim_end_matches('/')).ok()?;

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}
