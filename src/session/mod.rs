//! # Admin Sessions
//!
//! The administrator's browser session is a signed, self-contained token in
//! the `admin-session` cookie. Nothing is stored server-side: every request
//! re-verifies the HMAC and the expiry, so there is no session table and no
//! revocation list. A session ends when it expires or the secret rotates.
//!
//! ## Submodules
//! - `token`: issuing and validating the signed token
//! - `cookies`: names and attributes of the cookies this crate sets

pub mod cookies;
pub mod token;

pub use token::{SessionClaims, SessionCodec, ADMIN_SUBJECT};
