pub mod password;
pub mod token;

pub use password::*;
pub use token::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// Signature mismatch, expiry, or malformed payload. Deliberately opaque.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token encoding failed: {0}")]
    TokenEncoding(String),
}
