use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Record a refresh token id as spent.
///
/// Returns `false` when the id was already recorded, which means the token
/// is being replayed.
pub fn revoke_refresh_token(
    conn: &Connection,
    jti: &str,
    subject: &str,
    expires_at: i64,
    now: i64,
) -> Result<bool, DatabaseError> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO revoked_refresh_tokens (jti, subject, expires_at, revoked_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![jti, subject, expires_at, now],
    )?;
    Ok(inserted == 1)
}

/// Drop revocation records whose token would be rejected as expired anyway.
pub fn purge_expired_revocations(conn: &Connection, now: i64) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM revoked_refresh_tokens WHERE expires_at < ?1",
        params![now],
    )?;
    Ok(removed)
}
