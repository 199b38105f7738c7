#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use passkey_admin::config::Config;
use passkey_admin::db::credentials::{self, NewCredential};
use passkey_admin::db::models::CredentialId;
use passkey_admin::db::Database;
use passkey_admin::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub const HOST: &str = "localhost:8080";

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        database_url: "sqlite::memory:".to_string(),
        ip_hash_salt: "test-salt".to_string(),
        cookie_secret: "test-secret-key-for-testing".to_string(),
        origin: None,
        rp_id: None,
        rp_name: "Blog Admin".to_string(),
        session_ttl_secs: 7200,
        secure_cookies: false,
    }
}

pub fn test_state() -> AppState {
    AppState::with_database(test_config(), Database::in_memory())
}

/// Bind a placeholder credential, as if registration had already happened.
pub async fn seed_credential(state: &AppState, raw_id: &[u8]) {
    let pool = state.db.pool().await.unwrap();
    credentials::create(
        pool,
        &NewCredential {
            credential_id: CredentialId::from_bytes(raw_id),
            public_key: b"{}".to_vec(),
            passkey: b"{}".to_vec(),
            counter: 0,
            transports: vec!["internal".to_string()],
        },
    )
    .await
    .unwrap();
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// Every `Set-Cookie` header value.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    /// The `Set-Cookie` header for `name`, if any.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&format!("{name}=")))
    }

    /// The value assigned to `name` by this response.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookie(name).map(|c| {
            c[name.len() + 1..]
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// Send a request to the app with the given cookies and optional JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookies: &[(&str, &str)],
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST);

    if !cookies.is_empty() {
        let cookie_header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(header::COOKIE, cookie_header);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
    }
}
