//! # WebAuthn API Types
//!
//! JSON bodies returned by the ceremony endpoints. Request bodies are the
//! browser's credential objects, accepted as raw JSON and handed to
//! webauthn-rs so that a malformed one becomes a reported verification
//! failure instead of an extractor rejection.

use serde::Serialize;

/// Response to `/api/auth/*/options`
///
/// ## Example JSON
/// ```json
/// { "ok": true, "options": { "publicKey": { "challenge": "…", … } } }
/// ```
#[derive(Debug, Serialize)]
pub struct CeremonyOptions<T> {
    pub ok: bool,
    /// `CreationChallengeResponse` or `RequestChallengeResponse`
    pub options: T,
}

impl<T> CeremonyOptions<T> {
    pub fn new(options: T) -> Self {
        Self { ok: true, options }
    }
}

/// Response to a successful `/api/auth/*/verify`. Failures use the
/// `AppError` body instead.
#[derive(Debug, Serialize)]
pub struct CeremonyOutcome {
    pub ok: bool,
}

impl CeremonyOutcome {
    pub fn success() -> Self {
        Self { ok: true }
    }
}

/// Response to `/api/auth/status`, used by the admin entry page to decide
/// between "set up passkey", "log in" and the dashboard.
#[derive(Debug, Serialize)]
pub struct AuthStatus {
    /// A passkey has been registered
    pub initialized: bool,
    /// The request carries a valid `admin-session` cookie
    pub authenticated: bool,
}
