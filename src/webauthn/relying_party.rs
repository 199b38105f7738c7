//! # Relying Party Resolution
//!
//! Behind a reverse proxy the browser's origin is not the address the server
//! listens on, so the origin and RP ID used for a ceremony are derived from
//! the request:
//!
//! - host: first `X-Forwarded-Host` value, else `Host`, else `localhost:3000`
//! - scheme: `X-Forwarded-Proto`, else `http` for `localhost*` or hosts with
//!   an explicit port, else `https`
//! - RP ID: the host without its port
//!
//! `WEBAUTHN_ORIGIN` / `WEBAUTHN_RP_ID` override the derived values.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use webauthn_rs::prelude::*;

const FALLBACK_HOST: &str = "localhost:3000";

/// The origin and RP ID a ceremony is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    pub origin: Url,
    pub rp_id: String,
    pub rp_name: String,
}

impl RelyingParty {
    pub fn resolve(config: &Config, headers: &HeaderMap) -> AppResult<Self> {
        let host = first_header_value(headers, "x-forwarded-host")
            .or_else(|| first_header_value(headers, "host"))
            .unwrap_or_else(|| FALLBACK_HOST.to_string());

        let origin = match &config.origin {
            Some(origin) => origin.clone(),
            None => {
                let scheme = first_header_value(headers, "x-forwarded-proto").unwrap_or_else(|| {
                    if host.starts_with("localhost") || host.contains(':') {
                        "http".to_string()
                    } else {
                        "https".to_string()
                    }
                });
                format!("{scheme}://{host}")
            }
        };
        let origin = Url::parse(&origin)
            .map_err(|e| AppError::Internal(format!("Invalid WebAuthn origin {origin:?}: {e}")))?;

        let rp_id = config
            .rp_id
            .clone()
            .unwrap_or_else(|| strip_port(&host).to_string());

        Ok(RelyingParty {
            origin,
            rp_id,
            rp_name: config.rp_name.clone(),
        })
    }

    /// A verifier bound to this origin and RP ID.
    ///
    /// Fails if the origin's host is not the RP ID or one of its subdomains.
    pub fn webauthn(&self) -> AppResult<Webauthn> {
        let webauthn = WebauthnBuilder::new(&self.rp_id, &self.origin)?
            .rp_name(&self.rp_name)
            .build()?;

        Ok(webauthn)
    }
}

impl FromRequestParts<AppState> for RelyingParty {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        RelyingParty::resolve(&state.config, &parts.headers)
    }
}

/// First comma-separated value of a header, trimmed.
fn first_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, e.g. "[::1]:8080"
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    host.split(':').next().unwrap_or(host)
}
