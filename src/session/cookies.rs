//! Cookie names and attributes.
//!
//! Every cookie is `HttpOnly`, `Path=/`, `SameSite=Lax`, and `Secure` when
//! running in production.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Carries the signed admin session token.
pub const SESSION_COOKIE: &str = "admin-session";

/// Binds BeginRegistration to CompleteRegistration.
pub const REGISTRATION_CHALLENGE_COOKIE: &str = "webauthn-registration-challenge";

/// Binds BeginAuthentication to CompleteAuthentication.
pub const AUTHENTICATION_CHALLENGE_COOKIE: &str = "webauthn-authentication-challenge";

/// Lifetime of an in-flight ceremony.
pub const CHALLENGE_TTL_SECS: i64 = 5 * 60;

pub fn session_cookie(token: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    scoped(SESSION_COOKIE, token, ttl_secs, secure)
}

pub fn challenge_cookie(name: &'static str, challenge: String, secure: bool) -> Cookie<'static> {
    scoped(name, challenge, CHALLENGE_TTL_SECS, secure)
}

/// Pass to `CookieJar::remove` to make the browser drop `name`.
pub fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

fn scoped(name: &'static str, value: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(ttl_secs))
        .build()
}
