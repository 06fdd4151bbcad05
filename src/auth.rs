//! Login, refresh rotation, and bearer authentication.
//!
//! Unauthenticated → `login` → (access, refresh) → `refresh` → new pair.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::crypto::{self, check_kind, CryptoError, TokenKind, TokenPair, TokenService};
use crate::db::{self, DatabaseError};
use crate::models::{Role, User};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, forged, expired, wrong-kind, replayed, or for an unknown or
    /// inactive user. Callers never learn which.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Role {0} is not allowed to perform this action")]
    Forbidden(Role),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidToken => AuthError::InvalidToken,
            other => AuthError::Crypto(other),
        }
    }
}

/// The active user behind a validated access token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn user(&self) -> &User {
        &self.0
    }

    /// Capability hook: succeed only if the user's role is in `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(self.0.role))
        }
    }
}

/// Exchange email + password for a token pair.
pub fn login(
    conn: &Connection,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> Result<TokenPair, AuthError> {
    let Some(user) = db::get_user_by_email(conn, email)? else {
        crypto::verify_dummy_password(password);
        tracing::info!("Login rejected: unknown account");
        return Err(AuthError::InvalidCredentials);
    };

    let password_ok = crypto::verify_password(password, &user.password_hash)?;
    if !user.is_active || !password_ok {
        tracing::info!(user_id = user.id, active = user.is_active, "Login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    tracing::info!(user_id = user.id, "Login succeeded");
    Ok(tokens.issue_pair(&user.email)?)
}

/// Exchange a refresh token for a brand-new pair.
///
/// With `revoke_rotated` the presented token's `jti` is recorded and any
/// later presentation of the same token fails.
pub fn refresh(
    conn: &Connection,
    tokens: &TokenService,
    refresh_token: &str,
    revoke_rotated: bool,
) -> Result<TokenPair, AuthError> {
    let claims = tokens.decode(refresh_token)?;
    if !check_kind(&claims, TokenKind::Refresh) {
        return Err(AuthError::InvalidToken);
    }
    let user = active_user(conn, &claims.sub)?;

    if revoke_rotated {
        let jti = claims.jti.as_deref().ok_or(AuthError::InvalidToken)?;
        let first_use =
            db::revoke_refresh_token(conn, jti, &claims.sub, claims.exp, Utc::now().timestamp())?;
        if !first_use {
            tracing::warn!(user_id = user.id, "Rotated refresh token presented again");
            return Err(AuthError::InvalidToken);
        }
    }

    Ok(tokens.issue_pair(&user.email)?)
}

/// Resolve the user behind an access token.
pub fn authenticate(
    conn: &Connection,
    tokens: &TokenService,
    access_token: &str,
) -> Result<CurrentUser, AuthError> {
    let claims = tokens.decode(access_token)?;
    if !check_kind(&claims, TokenKind::Access) {
        return Err(AuthError::InvalidToken);
    }
    active_user(conn, &claims.sub).map(CurrentUser)
}

fn active_user(conn: &Connection, email: &str) -> Result<User, AuthError> {
    match db::get_user_by_email(conn, email)? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(AuthError::InvalidToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::NewUser;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;

    fn service() -> TokenService {
        TokenService::new("unit-secret", Algorithm::HS256, Duration::minutes(30), Duration::days(14))
    }

    fn seed(conn: &Connection, email: &str, password: &str, role: Role) {
        db::insert_user(
            conn,
            &NewUser {
                email: email.into(),
                full_name: "Staff".into(),
                role,
                password_hash: crypto::hash_password(password).unwrap(),
            },
        )
        .unwrap();
    }

    #[test]
    fn login_issues_access_for_email() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw-123", Role::Doctor);

        let pair = login(&conn, &svc, "doc@clinic.test", "pw-123").unwrap();
        let claims = svc.decode(&pair.access_token).unwrap();
        assert!(check_kind(&claims, TokenKind::Access));
        assert_eq!(claims.sub, "doc@clinic.test");
    }

    #[test]
    fn login_rejects_wrong_password_and_unknown_user() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw-123", Role::Doctor);

        assert!(matches!(
            login(&conn, &svc, "doc@clinic.test", "nope"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&conn, &svc, "ghost@clinic.test", "pw-123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn login_rejects_inactive_user_with_correct_password() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "old@clinic.test", "pw-123", Role::Tech);
        db::set_user_active(&conn, "old@clinic.test", false).unwrap();

        assert!(matches!(
            login(&conn, &svc, "old@clinic.test", "pw-123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn refresh_token_cannot_authenticate() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw", Role::Doctor);
        let pair = login(&conn, &svc, "doc@clinic.test", "pw").unwrap();

        assert!(matches!(
            authenticate(&conn, &svc, &pair.refresh_token),
            Err(AuthError::InvalidToken)
        ));
        assert!(authenticate(&conn, &svc, &pair.access_token).is_ok());
    }

    #[test]
    fn access_token_cannot_refresh() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw", Role::Doctor);
        let pair = login(&conn, &svc, "doc@clinic.test", "pw").unwrap();

        assert!(matches!(
            refresh(&conn, &svc, &pair.access_token, true),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_rotates_and_blocks_replay() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw", Role::Doctor);
        let first = login(&conn, &svc, "doc@clinic.test", "pw").unwrap();

        let second = refresh(&conn, &svc, &first.refresh_token, true).unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);
        assert!(authenticate(&conn, &svc, &second.access_token).is_ok());

        assert!(matches!(
            refresh(&conn, &svc, &first.refresh_token, true),
            Err(AuthError::InvalidToken)
        ));
        assert!(refresh(&conn, &svc, &second.refresh_token, true).is_ok());
    }

    #[test]
    fn refresh_replay_allowed_without_revocation() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw", Role::Doctor);
        let first = login(&conn, &svc, "doc@clinic.test", "pw").unwrap();

        refresh(&conn, &svc, &first.refresh_token, false).unwrap();
        assert!(refresh(&conn, &svc, &first.refresh_token, false).is_ok());
    }

    #[test]
    fn deactivated_user_loses_access_and_refresh() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "doc@clinic.test", "pw", Role::Doctor);
        let pair = login(&conn, &svc, "doc@clinic.test", "pw").unwrap();
        db::set_user_active(&conn, "doc@clinic.test", false).unwrap();

        assert!(matches!(
            authenticate(&conn, &svc, &pair.access_token),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            refresh(&conn, &svc, &pair.refresh_token, true),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn token_for_unknown_subject_rejected() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        let token = svc.issue("ghost@clinic.test", TokenKind::Access, Duration::minutes(5)).unwrap();
        assert!(matches!(authenticate(&conn, &svc, &token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn require_role_hook() {
        let conn = open_memory_database().unwrap();
        let svc = service();
        seed(&conn, "desk@clinic.test", "pw", Role::Reception);
        let pair = login(&conn, &svc, "desk@clinic.test", "pw").unwrap();
        let user = authenticate(&conn, &svc, &pair.access_token).unwrap();

        assert!(user.require_role(&[Role::Reception, Role::Admin]).is_ok());
        assert!(matches!(
            user.require_role(&[Role::Admin]),
            Err(AuthError::Forbidden(Role::Reception))
        ));
    }
}
