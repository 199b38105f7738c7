//! # Challenge Database Operations
//!
//! Verifier state for ceremonies in flight, keyed by the challenge string the
//! browser holds in its challenge cookie. Rows live for five minutes and are
//! consumed on first use; `main` sweeps whatever was abandoned.

use crate::db::models::{ChallengePurpose, StoredChallenge};
use crate::error::AppResult;
use crate::session::cookies::CHALLENGE_TTL_SECS;
use chrono::Utc;
use sqlx::SqlitePool;

/// Remember the verifier state for a ceremony that was just started.
///
/// `challenge` is the value handed to the browser (and kept in its challenge
/// cookie); it is what `take` looks the state up by.
pub async fn save(
    pool: &SqlitePool,
    purpose: ChallengePurpose,
    challenge: &str,
    state: &[u8],
) -> AppResult<()> {
    let now = Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO webauthn_challenges (challenge, purpose, state, created_at, expires_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(challenge)
    .bind(purpose.as_str())
    .bind(state)
    .bind(now)
    .bind(now + CHALLENGE_TTL_SECS)
    .execute(pool)
    .await?;

    Ok(())
}

/// Consume a challenge: the row is deleted whether or not it is still fresh,
/// so a challenge can be presented at most once.
///
/// Returns `None` if the challenge is unknown, belongs to the other ceremony
/// or has expired.
pub async fn take(
    pool: &SqlitePool,
    purpose: ChallengePurpose,
    challenge: &str,
) -> AppResult<Option<StoredChallenge>> {
    let stored = sqlx::query_as::<_, StoredChallenge>(
        "DELETE FROM webauthn_challenges
         WHERE challenge = ? AND purpose = ?
         RETURNING challenge, purpose, state, created_at, expires_at",
    )
    .bind(challenge)
    .bind(purpose.as_str())
    .fetch_optional(pool)
    .await?;

    let now = Utc::now().timestamp();
    Ok(stored.filter(|c| c.expires_at > now))
}

// Cleanup expired challenges (run periodically from main)
pub async fn cleanup_expired(pool: &SqlitePool) -> AppResult<u64> {
    let now = Utc::now().timestamp();

    let result = sqlx::query("DELETE FROM webauthn_challenges WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
