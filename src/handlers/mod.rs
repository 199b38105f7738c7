//! # HTTP Request Handlers
//!
//! ## Submodules
//! - `health`: health check endpoint (for monitoring)
//! - `auth`: passkey ceremonies, status and logout
//! - `admin`: endpoints for the logged-in administrator
//!
//! Handlers extract what they need (state, relying party, cookies, JSON
//! body), call into `webauthn`/`db`, and return JSON plus any cookie changes.

pub mod admin;
pub mod auth;
pub mod health;
