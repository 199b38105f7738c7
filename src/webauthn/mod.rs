//! # WebAuthn Module
//!
//! Passkey ceremonies for the single administrator.
//!
//! ## Submodules
//! - `relying_party`: origin / RP ID resolution per request
//! - `registration`: one-time passkey enrollment
//! - `authentication`: logging in with the bound passkey
//! - `types`: JSON bodies returned by the ceremony endpoints
//!
//! ## Ceremony Flow
//! Both ceremonies are two-phase: `Idle -> OptionsIssued -> Verified | Rejected`.
//!
//! 1. `start_*` checks the credential store, asks webauthn-rs for options,
//!    stores the verifier state under the options' challenge and returns the
//!    challenge so the handler can put it in a 5-minute cookie.
//! 2. The browser runs `navigator.credentials.create()` / `.get()`.
//! 3. `finish_*` consumes the stored state named by the cookie, verifies the
//!    response, updates the credential store and issues a session token.
//!
//! An abandoned ceremony simply expires with its challenge.

pub mod authentication;
pub mod registration;
pub mod relying_party;
pub mod types;

pub use relying_party::RelyingParty;

use crate::error::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;

/// Options for the browser plus the challenge they were issued with.
#[derive(Debug)]
pub struct CeremonyStart<T> {
    pub options: T,
    pub challenge: String,
}

/// The challenge as the browser will echo it back: unpadded base64url.
fn challenge_string<T: Serialize>(challenge: &T) -> AppResult<String> {
    match serde_json::to_value(challenge)? {
        Value::String(challenge) => Ok(challenge),
        other => Err(AppError::Internal(format!(
            "Unexpected challenge encoding: {other}"
        ))),
    }
}
