//! Staff password hashing (Argon2id, PHC string format).

use std::sync::OnceLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Argon2, PasswordHash, PasswordVerifier};

use super::CryptoError;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only an unparsable hash is an error.
pub fn verify_password(password: &str, hashed: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(hashed).map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::PasswordHash(e.to_string())),
    }
}

/// Spend the same effort as a real verification when there is no account,
/// so login latency does not reveal which emails exist.
pub fn verify_dummy_password(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    let dummy = DUMMY_HASH.get_or_init(|| hash_password("not-a-real-password").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}
