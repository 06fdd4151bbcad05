//! Middleware for protected routes.
//!
//! Stack (outermost → innermost): Extension(ApiContext) → Auth → Access log.

pub mod access_log;
pub mod auth;
