use crate::db::credentials;
use crate::error::AppResult;
use crate::middleware::auth::require_admin;
use crate::session::cookies::{
    self, AUTHENTICATION_CHALLENGE_COOKIE, REGISTRATION_CHALLENGE_COOKIE, SESSION_COOKIE,
};
use crate::state::AppState;
use crate::webauthn::types::{AuthStatus, CeremonyOptions, CeremonyOutcome};
use crate::webauthn::{authentication, registration, RelyingParty};
use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use serde_json::Value;
use webauthn_rs::prelude::{CreationChallengeResponse, RequestChallengeResponse};

// Registration endpoints

pub async fn register_options(
    State(state): State<AppState>,
    rp: RelyingParty,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<CeremonyOptions<CreationChallengeResponse>>)> {
    let start = registration::start_registration(&state, &rp).await?;

    let jar = jar.add(cookies::challenge_cookie(
        REGISTRATION_CHALLENGE_COOKIE,
        start.challenge,
        state.config.secure_cookies,
    ));

    Ok((jar, Json(CeremonyOptions::new(start.options))))
}

pub async fn register_verify(
    State(state): State<AppState>,
    rp: RelyingParty,
    jar: CookieJar,
    Json(credential): Json<Value>,
) -> AppResult<(CookieJar, Json<CeremonyOutcome>)> {
    let challenge = cookie_value(&jar, REGISTRATION_CHALLENGE_COOKIE);
    let token =
        registration::finish_registration(&state, &rp, challenge.as_deref(), &credential).await?;

    // First-ever setup logs the administrator straight in
    let jar = jar
        .remove(cookies::removal(REGISTRATION_CHALLENGE_COOKIE))
        .add(cookies::session_cookie(
            token,
            state.sessions.ttl_secs(),
            state.config.secure_cookies,
        ));

    Ok((jar, Json(CeremonyOutcome::success())))
}

// Authentication endpoints

pub async fn authenticate_options(
    State(state): State<AppState>,
    rp: RelyingParty,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<CeremonyOptions<RequestChallengeResponse>>)> {
    let start = authentication::start_authentication(&state, &rp).await?;

    let jar = jar.add(cookies::challenge_cookie(
        AUTHENTICATION_CHALLENGE_COOKIE,
        start.challenge,
        state.config.secure_cookies,
    ));

    Ok((jar, Json(CeremonyOptions::new(start.options))))
}

pub async fn authenticate_verify(
    State(state): State<AppState>,
    rp: RelyingParty,
    jar: CookieJar,
    Json(credential): Json<Value>,
) -> AppResult<(CookieJar, Json<CeremonyOutcome>)> {
    let challenge = cookie_value(&jar, AUTHENTICATION_CHALLENGE_COOKIE);
    let token =
        authentication::finish_authentication(&state, &rp, challenge.as_deref(), &credential)
            .await?;

    let jar = jar
        .remove(cookies::removal(AUTHENTICATION_CHALLENGE_COOKIE))
        .add(cookies::session_cookie(
            token,
            state.sessions.ttl_secs(),
            state.config.secure_cookies,
        ));

    Ok((jar, Json(CeremonyOutcome::success())))
}

// Session management

/// Drop the session cookie. Tokens are stateless, so a copied token stays
/// valid until it expires.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<CeremonyOutcome>) {
    (
        jar.remove(cookies::removal(SESSION_COOKIE)),
        Json(CeremonyOutcome::success()),
    )
}

pub async fn status(State(state): State<AppState>, jar: CookieJar) -> AppResult<Json<AuthStatus>> {
    let initialized = credentials::exists(state.db.pool().await?).await?;

    Ok(Json(AuthStatus {
        initialized,
        authenticated: require_admin(&jar, &state.sessions),
    }))
}

fn cookie_value(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|cookie| cookie.value().to_owned())
}
