//! # Database Models
//!
//! Row types for `passkey_credentials` and `webauthn_challenges`, plus the
//! canonical credential-id encoding.

use base64::prelude::*;
use serde::Serialize;
use std::fmt;

/// The administrator's bound passkey.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PasskeyCredential {
    /// Canonical credential id (see `CredentialId`)
    pub credential_id: String,

    /// Always `root`; unique across the table
    pub identity: String,

    /// COSE public key, JSON-encoded
    #[serde(skip)]
    pub public_key: Vec<u8>,

    /// Serialized `webauthn_rs::prelude::Passkey`, needed to start and
    /// verify authentication ceremonies
    #[serde(skip)]
    pub passkey: Vec<u8>,

    pub counter: i64,

    /// JSON array of transport hints ("usb", "internal", ...)
    pub transports: Option<String>,

    pub created_at: String,

    pub last_used_at: Option<String>,
}

impl PasskeyCredential {
    pub fn transport_hints(&self) -> Vec<String> {
        self.transports
            .as_deref()
            .and_then(|t| serde_json::from_str(t).ok())
            .unwrap_or_default()
    }
}

/// A row of `webauthn_challenges`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredChallenge {
    pub challenge: String,
    pub purpose: String,
    /// Serialized `PasskeyRegistration` or `PasskeyAuthentication`
    pub state: Vec<u8>,
    pub created_at: i64,
    pub expires_at: i64,
}

/// Which ceremony a challenge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengePurpose {
    Registration,
    Authentication,
}

impl ChallengePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengePurpose::Registration => "registration",
            ChallengePurpose::Authentication => "authentication",
        }
    }
}

/// A credential id in its one canonical text form: unpadded base64url.
///
/// Browsers, libraries and older rows don't agree on how to spell credential
/// ids, so every id is decoded to bytes and re-encoded before it is stored or
/// compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialId(String);

impl CredentialId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accepts standard or URL-safe base64, padded or not.
    pub fn parse(encoded: &str) -> Option<Self> {
        let normalized: String = encoded
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' => '-',
                '/' => '_',
                c => c,
            })
            .collect();

        let bytes = BASE64_URL_SAFE_NO_PAD.decode(normalized).ok()?;
        if bytes.is_empty() {
            return None;
        }
        Some(Self::from_bytes(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_id_spellings_normalize() {
        let bytes = [0xfb, 0xff, 0x01, 0x02, 0x03];
        let canonical = CredentialId::from_bytes(&bytes);
        assert_eq!(canonical.as_str(), "-_8BAgM");

        let standard_padded = BASE64_STANDARD.encode(bytes);
        assert_eq!(standard_padded, "+/8BAgM=");
        assert_eq!(CredentialId::parse(&standard_padded), Some(canonical.clone()));
        assert_eq!(CredentialId::parse("-_8BAgM="), Some(canonical.clone()));
        assert_eq!(CredentialId::parse("-_8BAgM"), Some(canonical));
    }

    #[test]
    fn credential_id_rejects_garbage() {
        assert_eq!(CredentialId::parse(""), None);
        assert_eq!(CredentialId::parse("***"), None);
    }

    #[test]
    fn transport_hints_tolerate_missing_column() {
        let mut credential = PasskeyCredential {
            credential_id: "AQID".to_string(),
            identity: "root".to_string(),
            public_key: Vec::new(),
            passkey: Vec::new(),
            counter: 0,
            transports: None,
            created_at: "2024-01-15T10:30:00+00:00".to_string(),
            last_used_at: None,
        };
        assert!(credential.transport_hints().is_empty());

        credential.transports = Some(r#"["usb","nfc"]"#.to_string());
        assert_eq!(credential.transport_hints(), vec!["usb", "nfc"]);
    }
}
