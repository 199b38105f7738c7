//! Signed session tokens.
//!
//! Wire format: `base64url(payload_json) "." base64url(hmac_sha256(secret, payload_json))`,
//! both segments without padding. The payload is
//! `{"sub":"root","iat":<secs>,"exp":<secs>,"jti":"<32 hex chars>"}`.

use base64::prelude::*;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The single administrator every session belongs to.
pub const ADMIN_SUBJECT: &str = "root";

/// Decoded session payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    /// Random per-issuance nonce
    pub jti: String,
}

/// Issues and validates `admin-session` tokens.
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    ttl_secs: i64,
}

impl SessionCodec {
    pub fn new(secret: impl AsRef<[u8]>, ttl_secs: i64) -> Self {
        Self {
            mac: HmacSha256::new_from_slice(secret.as_ref())
                .expect("HMAC can accept any key length"),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a fresh token valid for the configured TTL.
    pub fn issue(&self) -> String {
        self.issue_at(Utc::now().timestamp())
    }

    pub fn issue_at(&self, now: i64) -> String {
        let mut nonce = [0u8; 16];
        OsRng.fill_bytes(&mut nonce);

        let claims = SessionClaims {
            sub: ADMIN_SUBJECT.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: nonce.iter().map(|b| format!("{b:02x}")).collect(),
        };

        // Serializing a struct of strings and integers can't fail
        let payload = serde_json::to_vec(&claims).unwrap_or_default();
        let signature = self.mac().chain_update(&payload).finalize().into_bytes();

        format!(
            "{}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(&payload),
            BASE64_URL_SAFE_NO_PAD.encode(signature)
        )
    }

    /// True iff the token was signed with our secret and has not expired.
    ///
    /// Never panics and never errors: anything malformed is simply invalid.
    pub fn validate(&self, token: &str) -> bool {
        self.decode(token).is_some()
    }

    pub fn validate_at(&self, token: &str, now: i64) -> bool {
        self.decode_at(token, now).is_some()
    }

    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Verify and decode a token as of `now` (unix seconds).
    pub fn decode_at(&self, token: &str, now: i64) -> Option<SessionClaims> {
        let (payload_b64, signature_b64) = token.split_once('.')?;
        if payload_b64.is_empty() || signature_b64.is_empty() {
            return None;
        }

        let payload = BASE64_URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = BASE64_URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        // verify_slice compares in constant time
        self.mac()
            .chain_update(&payload)
            .verify_slice(&signature)
            .ok()?;

        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if claims.sub != ADMIN_SUBJECT || claims.exp <= now {
            return None;
        }

        Some(claims)
    }

    fn mac(&self) -> HmacSha256 {
        self.mac.clone()
    }
}
