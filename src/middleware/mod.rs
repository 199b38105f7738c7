//! # Middleware Module
//!
//! Middleware intercepts HTTP requests before they reach a handler.
//!
//! ## Our Middleware
//! - `auth`: the `/admin/*` route guard, the `AdminSession` extractor and the
//!   `require_admin` check offered to content write actions

pub mod auth;
