//! # Configuration Management
//!
//! Configuration comes from the environment ("12-factor" style), with a `.env`
//! file loaded first for local development.
//!
//! ## Required Environment Variables
//! The process refuses to start if any of these is missing or empty:
//! - `DATABASE_URL`: SQLite connection string
//! - `IP_HASH_SALT`: salt for the blog's view/reaction IP hashing
//! - `WEBAUTHN_COOKIE_SECRET`: HMAC key for the `admin-session` cookie
//! - `WEBAUTHN_ORIGIN`: expected WebAuthn origin (full URL)
//! - `WEBAUTHN_RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `WEBAUTHN_RP_NAME`: human-readable name shown by the authenticator
//! - `WEBAUTHN_PASSKEY_TTL`: admin session lifetime in hours
//!
//! ## Optional
//! - `HOST` (default `127.0.0.1`), `PORT` (default `8080`)
//! - `APP_ENV`: `production` marks every cookie `Secure`

use anyhow::{bail, Context, Result};
use std::fmt;

/// Session lifetime used when `WEBAUTHN_PASSKEY_TTL` is unusable.
pub const DEFAULT_SESSION_TTL_HOURS: f64 = 2.0;

/// Longest session lifetime accepted from `WEBAUTHN_PASSKEY_TTL` (one year).
pub const MAX_SESSION_TTL_HOURS: f64 = 24.0 * 365.0;

const REQUIRED_VARS: [&str; 7] = [
    "DATABASE_URL",
    "IP_HASH_SALT",
    "WEBAUTHN_COOKIE_SECRET",
    "WEBAUTHN_ORIGIN",
    "WEBAUTHN_RP_ID",
    "WEBAUTHN_RP_NAME",
    "WEBAUTHN_PASSKEY_TTL",
];

/// Application configuration
///
/// ## WebAuthn Terminology
/// - **RP (Relying Party)**: this application
/// - **RP ID**: the domain credentials are scoped to (e.g. "example.com")
/// - **Origin**: the full URL the browser sees (e.g. "https://example.com")
///
/// `origin` and `rp_id` are overrides. When absent, both are derived per
/// request from the forwarded-host headers (see `webauthn::relying_party`).
#[derive(Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number
    pub port: u16,

    /// SQLite database connection URL, e.g. "sqlite:admin.db?mode=rwc"
    pub database_url: String,

    /// Salt handed to the view/reaction collaborators. Not used by the auth core.
    pub ip_hash_salt: String,

    /// HMAC-SHA256 key for session tokens
    pub cookie_secret: String,

    /// Expected origin override
    pub origin: Option<String>,

    /// Relying Party ID override
    pub rp_id: Option<String>,

    /// Shown to the administrator while creating the passkey
    pub rp_name: String,

    /// Lifetime of an `admin-session` token, in seconds
    pub session_ttl_secs: i64,

    /// Set the `Secure` attribute on cookies
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self> {
        // dotenvy doesn't error if the file is missing
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// Every missing required variable is reported at once, so a broken
    /// deployment can be fixed in one pass.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing required environment variables: {}. \
                 Set them in the environment or a .env file; the server cannot start without them.",
                missing.join(", ")
            );
        }

        let require = |key: &str| get(key).unwrap_or_default();

        let port = match get("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got {port:?}"))?,
            None => 8080,
        };

        Ok(Config {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database_url: require("DATABASE_URL"),
            ip_hash_salt: require("IP_HASH_SALT"),
            cookie_secret: require("WEBAUTHN_COOKIE_SECRET"),
            origin: get("WEBAUTHN_ORIGIN"),
            rp_id: get("WEBAUTHN_RP_ID"),
            rp_name: require("WEBAUTHN_RP_NAME"),
            session_ttl_secs: session_ttl_secs(&require("WEBAUTHN_PASSKEY_TTL")),
            secure_cookies: get("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")),
        })
    }

    /// Combine host and port for `tokio::net::TcpListener::bind()`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Convert the configured session lifetime (hours, fractional allowed) into
/// whole seconds. Anything unparsable, non-finite or non-positive means 2 hours;
/// larger values are capped at [`MAX_SESSION_TTL_HOURS`].
pub fn session_ttl_secs(hours: &str) -> i64 {
    let hours = hours
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite() && *h > 0.0)
        .unwrap_or(DEFAULT_SESSION_TTL_HOURS)
        .min(MAX_SESSION_TTL_HOURS);

    (hours * 3600.0).floor() as i64
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("ip_hash_salt", &"<redacted>")
            .field("cookie_secret", &"<redacted>")
            .field("origin", &self.origin)
            .field("rp_id", &self.rp_id)
            .field("rp_name", &self.rp_name)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("IP_HASH_SALT", "salt"),
            ("WEBAUTHN_COOKIE_SECRET", "super-secret"),
            ("WEBAUTHN_ORIGIN", "https://blog.example.com"),
            ("WEBAUTHN_RP_ID", "blog.example.com"),
            ("WEBAUTHN_RP_NAME", "Blog Admin"),
            ("WEBAUTHN_PASSKEY_TTL", "4"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn loads_complete_environment() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.origin.as_deref(), Some("https://blog.example.com"));
        assert_eq!(config.rp_id.as_deref(), Some("blog.example.com"));
        assert_eq!(config.session_ttl_secs, 4 * 3600);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn reports_every_missing_variable() {
        let mut env = full_env();
        env.remove("WEBAUTHN_COOKIE_SECRET");
        env.insert("WEBAUTHN_RP_NAME", "");

        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("WEBAUTHN_COOKIE_SECRET"), "{err}");
        assert!(err.contains("WEBAUTHN_RP_NAME"), "{err}");
        assert!(!err.contains("DATABASE_URL"), "{err}");
    }

    #[test]
    fn rejects_invalid_port() {
        let mut env = full_env();
        env.insert("PORT", "eighty");
        assert!(load(&env).is_err());
    }

    #[test]
    fn production_enables_secure_cookies() {
        let mut env = full_env();
        env.insert("APP_ENV", "production");
        assert!(load(&env).unwrap().secure_cookies);
    }

    #[test]
    fn session_ttl_falls_back_to_two_hours() {
        assert_eq!(session_ttl_secs("0"), 7200);
        assert_eq!(session_ttl_secs("-3"), 7200);
        assert_eq!(session_ttl_secs("NaN"), 7200);
        assert_eq!(session_ttl_secs("inf"), 7200);
        assert_eq!(session_ttl_secs("soon"), 7200);
        assert_eq!(session_ttl_secs("0.5"), 1800);
    }

    #[test]
    fn session_ttl_is_capped_at_one_year() {
        assert_eq!(session_ttl_secs("1e300"), 365 * 24 * 3600);
        assert_eq!(session_ttl_secs("8760"), 365 * 24 * 3600);
        assert_eq!(session_ttl_secs("100000"), 365 * 24 * 3600);
        assert_eq!(session_ttl_secs("8759"), 8759 * 3600);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&full_env()).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
