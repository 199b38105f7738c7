//! # Passkey Registration Logic
//!
//! One-time enrollment of the administrator's passkey. Registration is only
//! possible while no credential exists; the first success seeds the single
//! administrator identity and logs the browser in.
//!
//! ## Registration Flow
//! 1. **Start**: refuse if already initialized → generate options → store the
//!    challenge's verifier state
//! 2. **Finish**: re-check initialization → consume the challenge → verify the
//!    attestation → store the credential → issue a session token

use crate::db::credentials::{self, NewCredential, ADMIN_IDENTITY};
use crate::db::models::{ChallengePurpose, CredentialId};
use crate::db::challenges;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webauthn::{challenge_string, CeremonyStart, RelyingParty};
use anyhow::Context;
use serde_json::Value;
use uuid::Uuid;
use webauthn_rs::prelude::*;

/// WebAuthn user handle of the administrator. Fixed, since there is only one.
pub const ADMIN_USER_ID: Uuid = Uuid::from_u128(0x7f1c_5e0a_3b6d_4c2e_9a8f_0d1e_2b3c_4d5e);

/// Start the passkey registration process
///
/// ## Errors
/// - `AlreadyInitialized`: a passkey is already bound
/// - `WebAuthn`: the resolved origin doesn't belong to the RP ID
pub async fn start_registration(
    state: &AppState,
    rp: &RelyingParty,
) -> AppResult<CeremonyStart<CreationChallengeResponse>> {
    let pool = state.db.pool().await?;

    if credentials::exists(pool).await? {
        return Err(AppError::AlreadyInitialized);
    }

    // An empty exclude list: there is nothing to exclude on first setup
    let (ccr, reg_state) = rp.webauthn()?.start_passkey_registration(
        ADMIN_USER_ID,
        ADMIN_IDENTITY,
        ADMIN_IDENTITY,
        Some(Vec::new()),
    )?;

    let challenge = challenge_string(&ccr.public_key.challenge)?;

    // reg_state holds the challenge, RP and user the response must match
    let state_bytes = serde_json::to_vec(&reg_state)?;
    challenges::save(pool, ChallengePurpose::Registration, &challenge, &state_bytes).await?;

    tracing::debug!(rp_id = %rp.rp_id, origin = %rp.origin, "Registration options issued");

    Ok(CeremonyStart {
        options: ccr,
        challenge,
    })
}

/// Finish the passkey registration process and return a new session token.
///
/// `challenge` is the value of the registration challenge cookie and
/// `credential` the JSON-encoded result of `navigator.credentials.create()`.
///
/// ## Errors
/// - `AlreadyInitialized`: a passkey was bound since the ceremony started
///   (checked again here and enforced by the insert itself)
/// - `ChallengeMissing`: no cookie, or its challenge is unknown/expired/used
/// - `VerificationFailed`: the attestation doesn't verify, for any reason
pub async fn finish_registration(
    state: &AppState,
    rp: &RelyingParty,
    challenge: Option<&str>,
    credential: &Value,
) -> AppResult<String> {
    let pool = state.db.pool().await?;

    if credentials::exists(pool).await? {
        return Err(AppError::AlreadyInitialized);
    }

    let challenge = challenge
        .filter(|c| !c.is_empty())
        .ok_or(AppError::ChallengeMissing)?;
    let stored = challenges::take(pool, ChallengePurpose::Registration, challenge)
        .await?
        .ok_or(AppError::ChallengeMissing)?;

    let passkey = verify_attestation(rp, &stored.state, credential).map_err(|e| {
        tracing::warn!("Passkey registration rejected: {:#}", e);
        AppError::VerificationFailed
    })?;

    let serialized = serde_json::to_value(&passkey)?;
    let counter = passkey_counter(&serialized).ok_or_else(|| {
        AppError::Internal("Registered passkey has no signature counter".to_string())
    })?;

    let new_credential = NewCredential {
        credential_id: credential_id_of(&passkey)?,
        public_key: serde_json::to_vec(passkey.get_public_key())?,
        passkey: serde_json::to_vec(&serialized)?,
        counter,
        transports: transport_hints(credential),
    };

    credentials::create(pool, &new_credential).await?;

    tracing::info!(
        credential_id = %new_credential.credential_id,
        "Administrator passkey registered"
    );

    Ok(state.sessions.issue())
}

fn verify_attestation(
    rp: &RelyingParty,
    state_bytes: &[u8],
    credential: &Value,
) -> anyhow::Result<Passkey> {
    let reg_state: PasskeyRegistration =
        serde_json::from_slice(state_bytes).context("stored registration state is unreadable")?;

    let reg_credential: RegisterPublicKeyCredential =
        serde_json::from_value(credential.clone()).context("malformed attestation response")?;

    let passkey = rp
        .webauthn()?
        .finish_passkey_registration(&reg_credential, &reg_state)?;

    Ok(passkey)
}

fn credential_id_of(passkey: &Passkey) -> AppResult<CredentialId> {
    let encoded = serde_json::to_value(passkey.cred_id())?;
    encoded
        .as_str()
        .and_then(CredentialId::parse)
        .ok_or_else(|| AppError::Internal("Passkey has an unreadable credential id".to_string()))
}

/// Signature counter the authenticator reported at enrollment, as recorded
/// in the serialized passkey (`cred.counter`).
fn passkey_counter(serialized: &Value) -> Option<u32> {
    serialized
        .pointer("/cred/counter")
        .and_then(Value::as_u64)
        .and_then(|counter| u32::try_from(counter).ok())
}

/// Transport hints reported by the browser (`response.transports`). Advisory.
fn transport_hints(credential: &Value) -> Vec<String> {
    credential
        .pointer("/response/transports")
        .and_then(Value::as_array)
        .map(|hints| {
            hints
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_transport_hints() {
        let credential = json!({
            "id": "AQID",
            "response": { "transports": ["internal", "hybrid", 7] }
        });
        assert_eq!(transport_hints(&credential), vec!["internal", "hybrid"]);
        assert!(transport_hints(&json!({ "id": "AQID" })).is_empty());
    }

    #[test]
    fn admin_user_handle_is_a_fixed_v4_uuid() {
        assert_eq!(ADMIN_USER_ID.get_version(), Some(uuid::Version::Random));
        assert_eq!(ADMIN_USER_ID.get_variant(), uuid::Variant::RFC4122);
        assert_eq!(
            ADMIN_USER_ID.to_string(),
            "7f1c5e0a-3b6d-4c2e-9a8f-0d1e2b3c4d5e"
        );
    }

    #[test]
    fn reads_enrollment_counter() {
        assert_eq!(passkey_counter(&json!({ "cred": { "counter": 42 } })), Some(42));
        assert_eq!(passkey_counter(&json!({ "cred": { "counter": 0 } })), Some(0));
        assert_eq!(passkey_counter(&json!({ "cred": {} })), None);
        assert_eq!(passkey_counter(&json!({ "cred": { "counter": 1u64 << 40 } })), None);
    }
}
