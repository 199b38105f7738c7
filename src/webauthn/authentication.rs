use crate::db::challenges;
use crate::db::credentials;
use crate::db::models::{ChallengePurpose, CredentialId, PasskeyCredential};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::webauthn::{challenge_string, CeremonyStart, RelyingParty};
use anyhow::{bail, Context};
use serde_json::Value;
use webauthn_rs::prelude::*;

/// Start a login with the bound passkey.
///
/// The options only allow the administrator's credential.
pub async fn start_authentication(
    state: &AppState,
    rp: &RelyingParty,
) -> AppResult<CeremonyStart<RequestChallengeResponse>> {
    let pool = state.db.pool().await?;

    let stored = credentials::find_admin(pool)
        .await?
        .ok_or(AppError::NotInitialized)?;

    let passkey: Passkey = serde_json::from_slice(&stored.passkey)?;

    let (rcr, auth_state) = rp.webauthn()?.start_passkey_authentication(&[passkey])?;

    let challenge = challenge_string(&rcr.public_key.challenge)?;
    let state_bytes = serde_json::to_vec(&auth_state)?;
    challenges::save(pool, ChallengePurpose::Authentication, &challenge, &state_bytes).await?;

    Ok(CeremonyStart {
        options: rcr,
        challenge,
    })
}

/// Verify an assertion and return a new session token.
///
/// On success the authenticator's new signature counter is stored. A counter
/// that fails to advance is treated by webauthn-rs as a possibly cloned
/// authenticator and the assertion is rejected.
///
/// ## Errors
/// - `CredentialNotFound`: the response's `rawId` isn't the bound credential
/// - `ChallengeMissing`: no cookie, or its challenge is unknown/expired/used
/// - `VerificationFailed`: the assertion doesn't verify, for any reason
pub async fn finish_authentication(
    state: &AppState,
    rp: &RelyingParty,
    challenge: Option<&str>,
    credential: &Value,
) -> AppResult<String> {
    let pool = state.db.pool().await?;

    let credential_id = credential
        .get("rawId")
        .or_else(|| credential.get("id"))
        .and_then(Value::as_str)
        .and_then(CredentialId::parse)
        .ok_or(AppError::CredentialNotFound)?;

    let stored = credentials::find_by_credential_id(pool, &credential_id)
        .await?
        .ok_or(AppError::CredentialNotFound)?;

    let challenge = challenge
        .filter(|c| !c.is_empty())
        .ok_or(AppError::ChallengeMissing)?;
    let taken = challenges::take(pool, ChallengePurpose::Authentication, challenge)
        .await?
        .ok_or(AppError::ChallengeMissing)?;

    let (passkey, new_counter) =
        verify_assertion(rp, &stored, &taken.state, credential).map_err(|e| {
            tracing::warn!("Passkey authentication rejected: {:#}", e);
            AppError::VerificationFailed
        })?;

    let passkey_bytes = serde_json::to_vec(&passkey)?;
    credentials::update_counter(pool, &stored.credential_id, new_counter, &passkey_bytes).await?;

    tracing::info!(
        credential_id = %stored.credential_id,
        counter = new_counter,
        "Administrator authenticated"
    );

    Ok(state.sessions.issue())
}

/// Returns the passkey with its counter advanced, and the new counter.
fn verify_assertion(
    rp: &RelyingParty,
    stored: &PasskeyCredential,
    state_bytes: &[u8],
    credential: &Value,
) -> anyhow::Result<(Passkey, u32)> {
    let auth_state: PasskeyAuthentication =
        serde_json::from_slice(state_bytes).context("stored authentication state is unreadable")?;

    let assertion: PublicKeyCredential =
        serde_json::from_value(credential.clone()).context("malformed assertion response")?;

    let result = rp
        .webauthn()?
        .finish_passkey_authentication(&assertion, &auth_state)?;

    let mut passkey: Passkey =
        serde_json::from_slice(&stored.passkey).context("stored passkey is unreadable")?;

    // None means the assertion came from some other credential
    if passkey.update_credential(&result).is_none() {
        bail!("assertion was produced by a different credential");
    }

    Ok((passkey, result.counter()))
}
