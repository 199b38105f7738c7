//! # Passkey Admin
//!
//! Authentication core for a single-administrator site: one passkey,
//! registered once, used to log in; sessions are stateless HMAC-signed
//! cookies checked on every `/admin/*` request.
//!
//! ## Modules
//! - `config`: environment configuration
//! - `db`: SQLite persistence (the bound credential and in-flight challenges)
//! - `error`: error taxonomy and HTTP mapping
//! - `handlers`: HTTP route handlers
//! - `middleware`: the admin route guard
//! - `routes`: router assembly
//! - `session`: signed session tokens and cookie attributes
//! - `state`: shared application state
//! - `webauthn`: registration and authentication ceremonies

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod webauthn;

pub use routes::build_router;
