use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use v4vision_core::UserId;

/// Short-lived access token or long-lived refresh token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims model (transport-agnostic).
///
/// Only the subject is carried; role and company are loaded from the user
/// store on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    pub token_type: TokenKind,

    /// Unique token id; refresh tokens are revoked by this value.
    pub jti: Uuid,

    /// Issued-at, seconds since the epoch.
    pub iat: i64,

    /// Expiration, seconds since the epoch.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("expected a {expected:?} token, got {found:?}")]
    WrongKind { expected: TokenKind, found: TokenKind },
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::jwt::TokenCodec`].
pub fn validate_claims(
    claims: &JwtClaims,
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.token_type != expected {
        return Err(TokenValidationError::WrongKind {
            expected,
            found: claims.token_type,
        });
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims(kind: TokenKind, now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: UserId::new(),
            token_type: kind,
            jti: Uuid::now_v7(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(5)).timestamp(),
        }
    }

    #[test]
    fn valid_window_passes() {
        let now = Utc::now();
        assert!(validate_claims(&claims(TokenKind::Access, now), TokenKind::Access, now).is_ok());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let now = Utc::now();
        let err = validate_claims(&claims(TokenKind::Refresh, now), TokenKind::Access, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::WrongKind { .. }));
    }

    #[test]
    fn expiry_and_future_issue_are_rejected() {
        let now = Utc::now();
        let c = claims(TokenKind::Access, now);
        assert_eq!(
            validate_claims(&c, TokenKind::Access, now + Duration::minutes(5)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, TokenKind::Access, now - Duration::minutes(1)),
            Err(TokenValidationError::NotYetValid)
        );
    }
}
