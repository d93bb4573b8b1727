use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use wholesale_core::UserId;

use crate::{Principal, Role};

/// JWT claims model (transport-agnostic).
///
/// `iat`/`exp` travel as NumericDate (seconds since the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    pub sub: UserId,

    /// Display name of the user.
    pub name: String,

    pub role: Role,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl JwtClaims {
    pub fn new(
        sub: UserId,
        name: impl Into<String>,
        role: Role,
        issued_at: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            sub,
            name: name.into(),
            role,
            issued_at,
            expires_at: issued_at + ttl,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.sub, self.name.clone(), self.role)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims against `now`.
///
/// This validates the *claims* only; signature checks live in [`crate::jwt`].
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn claims_at(issued: DateTime<Utc>) -> JwtClaims {
        JwtClaims::new(UserId::new(), "Asha", Role::Clerk, issued, Duration::hours(1))
    }

    #[test]
    fn window_checks() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let claims = claims_at(t0);

        assert_eq!(validate_claims(&claims, t0 - Duration::seconds(1)), Err(TokenValidationError::NotYetValid));
        assert_eq!(validate_claims(&claims, t0 + Duration::minutes(30)), Ok(()));
        assert_eq!(validate_claims(&claims, t0 + Duration::hours(1)), Err(TokenValidationError::Expired));

        let mut broken = claims.clone();
        broken.expires_at = broken.issued_at;
        assert_eq!(validate_claims(&broken, t0), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn timestamps_serialize_as_seconds() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(claims_at(t0)).unwrap();
        assert_eq!(json["iat"], t0.timestamp());
        assert_eq!(json["exp"], t0.timestamp() + 3600);
        assert_eq!(json["role"], "clerk");
    }
}
