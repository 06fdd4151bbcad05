//! Signed, time-limited bearer tokens.
//!
//! One shared secret signs both kinds; the `type` claim is the only thing
//! separating an access token from a refresh token, so every consumer must
//! call [`check_kind`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CryptoError;
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Token payload. `sub`, `type`, `iat`, `exp` are the wire contract;
/// refresh tokens also carry a `jti` so they can be revoked on rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// Equality on the `type` claim.
pub fn check_kind(claims: &Claims, expected: TokenKind) -> bool {
    claims.token_type == expected.as_str()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.jwt_secret,
            settings.jwt_algorithm,
            settings.access_token_ttl(),
            settings.refresh_token_ttl(),
        )
    }

    pub fn issue(&self, subject: &str, kind: TokenKind, ttl: Duration) -> Result<String, CryptoError> {
        self.issue_at(subject, kind, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, CryptoError> {
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| CryptoError::TokenEncoding(format!("expiry out of range for ttl {ttl}")))?;
        let claims = Claims {
            sub: subject.to_string(),
            token_type: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            jti: match kind {
                TokenKind::Refresh => Some(Uuid::new_v4().to_string()),
                TokenKind::Access => None,
            },
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| CryptoError::TokenEncoding(e.to_string()))
    }

    /// Fresh access + refresh pair for `subject` using the configured TTLs.
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, CryptoError> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.issue(subject, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    /// Verify signature, algorithm and expiry. Every failure collapses to
    /// `InvalidToken`.
    pub fn decode(&self, token: &str) -> Result<Claims, CryptoError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                CryptoError::InvalidToken
            })
    }
}
