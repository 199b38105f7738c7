//! # Credential Database Operations
//!
//! The administrator has exactly one passkey. The `identity` column is always
//! [`ADMIN_IDENTITY`] and carries a UNIQUE constraint, so the database itself
//! refuses a second credential even when two registrations race past the
//! application-level existence check.
//!
//! ## Security Note
//! Only public keys are stored - private keys never leave the authenticator.

use crate::db::models::{CredentialId, PasskeyCredential};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sqlx::SqlitePool;

/// Identity the single credential is bound to.
pub const ADMIN_IDENTITY: &str = "root";

/// Everything needed to persist a freshly registered passkey.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub credential_id: CredentialId,
    pub public_key: Vec<u8>,
    pub passkey: Vec<u8>,
    pub counter: u32,
    pub transports: Vec<String>,
}

/// True once the administrator's passkey has been registered.
pub async fn exists(pool: &SqlitePool) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM passkey_credentials LIMIT 1")
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// The bound credential, if any.
pub async fn find_admin(pool: &SqlitePool) -> AppResult<Option<PasskeyCredential>> {
    let credential = sqlx::query_as::<_, PasskeyCredential>(
        "SELECT * FROM passkey_credentials WHERE identity = ?",
    )
    .bind(ADMIN_IDENTITY)
    .fetch_optional(pool)
    .await?;

    Ok(credential)
}

/// Store the administrator's passkey.
///
/// ## Errors
/// `AlreadyInitialized` if a credential already exists. This is decided by
/// the UNIQUE constraints, not by a prior read.
pub async fn create(pool: &SqlitePool, credential: &NewCredential) -> AppResult<()> {
    let transports_json = serde_json::to_string(&credential.transports)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO passkey_credentials
         (credential_id, identity, public_key, passkey, counter, transports, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(credential.credential_id.as_str())
    .bind(ADMIN_IDENTITY)
    .bind(&credential.public_key)
    .bind(&credential.passkey)
    .bind(i64::from(credential.counter))
    .bind(transports_json)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::AlreadyInitialized,
        _ => AppError::Database(e),
    })?;

    Ok(())
}

/// Find a credential by id.
///
/// Ids are stored canonically, so the indexed lookup is normally the only
/// query. Rows written under a different spelling are still found by
/// normalizing every stored id; there is at most one row, so the scan is
/// trivial.
pub async fn find_by_credential_id(
    pool: &SqlitePool,
    credential_id: &CredentialId,
) -> AppResult<Option<PasskeyCredential>> {
    let credential = sqlx::query_as::<_, PasskeyCredential>(
        "SELECT * FROM passkey_credentials WHERE credential_id = ?",
    )
    .bind(credential_id.as_str())
    .fetch_optional(pool)
    .await?;

    if credential.is_some() {
        return Ok(credential);
    }

    let all = sqlx::query_as::<_, PasskeyCredential>("SELECT * FROM passkey_credentials")
        .fetch_all(pool)
        .await?;

    Ok(all.into_iter().find(|stored| {
        CredentialId::parse(&stored.credential_id).as_ref() == Some(credential_id)
    }))
}

/// Record the authenticator's new signature counter.
///
/// Unconditional: the clone check already happened during assertion
/// verification. The serialized passkey is replaced too, because that copy
/// is what the next verification compares counters against.
pub async fn update_counter(
    pool: &SqlitePool,
    credential_id: &str,
    new_counter: u32,
    passkey: &[u8],
) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "UPDATE passkey_credentials
         SET counter = ?, passkey = ?, last_used_at = ?
         WHERE credential_id = ?",
    )
    .bind(i64::from(new_counter))
    .bind(passkey)
    .bind(now)
    .bind(credential_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_credential(id: &[u8]) -> NewCredential {
        NewCredential {
            credential_id: CredentialId::from_bytes(id),
            public_key: b"{\"cose\":true}".to_vec(),
            passkey: b"{}".to_vec(),
            counter: 0,
            transports: vec!["internal".to_string(), "hybrid".to_string()],
        }
    }

    #[tokio::test]
    async fn create_then_exists() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();

        assert!(!exists(pool).await.unwrap());
        assert!(find_admin(pool).await.unwrap().is_none());

        create(pool, &new_credential(&[1, 2, 3])).await.unwrap();

        assert!(exists(pool).await.unwrap());
        let stored = find_admin(pool).await.unwrap().unwrap();
        assert_eq!(stored.identity, "root");
        assert_eq!(stored.credential_id, "AQID");
        assert_eq!(stored.counter, 0);
        assert_eq!(stored.transport_hints(), vec!["internal", "hybrid"]);
    }

    #[tokio::test]
    async fn second_credential_is_rejected() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();

        create(pool, &new_credential(&[1, 2, 3])).await.unwrap();

        let err = create(pool, &new_credential(&[9, 9, 9])).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyInitialized));

        let err = create(pool, &new_credential(&[1, 2, 3])).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn racing_creates_yield_exactly_one_winner() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();

        let first = new_credential(&[1]);
        let second = new_credential(&[2]);
        let (a, b) = tokio::join!(create(pool, &first), create(pool, &second));

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AppError::AlreadyInitialized))));
    }

    #[tokio::test]
    async fn finds_by_any_spelling_of_the_id() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();
        create(pool, &new_credential(&[0xfb, 0xff, 0x01])).await.unwrap();

        let canonical = CredentialId::parse("-_8B").unwrap();
        assert!(find_by_credential_id(pool, &canonical).await.unwrap().is_some());

        let other = CredentialId::from_bytes(&[7, 7, 7]);
        assert!(find_by_credential_id(pool, &other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finds_rows_stored_with_legacy_encoding() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();

        // A row written before ids were canonicalized
        sqlx::query(
            "INSERT INTO passkey_credentials
             (credential_id, identity, public_key, passkey, counter, created_at)
             VALUES ('+/8B', 'root', x'00', x'00', 3, '2024-01-15T10:30:00+00:00')",
        )
        .execute(pool)
        .await
        .unwrap();

        let id = CredentialId::from_bytes(&[0xfb, 0xff, 0x01]);
        let found = find_by_credential_id(pool, &id).await.unwrap().unwrap();
        assert_eq!(found.credential_id, "+/8B");
        assert_eq!(found.counter, 3);
    }

    #[tokio::test]
    async fn update_counter_overwrites_state() {
        let db = Database::in_memory();
        let pool = db.pool().await.unwrap();
        create(pool, &new_credential(&[1, 2, 3])).await.unwrap();

        update_counter(pool, "AQID", 42, b"{\"updated\":true}").await.unwrap();

        let stored = find_admin(pool).await.unwrap().unwrap();
        assert_eq!(stored.counter, 42);
        assert_eq!(stored.passkey, b"{\"updated\":true}");
        assert!(stored.last_used_at.is_some());
    }
}
