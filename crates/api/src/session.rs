//! Token issuing at sign-in.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use wholesale_auth::{Hs256Jwt, JwtClaims, JwtError, User, UserProfile};
use wholesale_core::Entity;

#[derive(Debug, Clone)]
pub struct SessionIssuer {
    jwt: Arc<Hs256Jwt>,
    ttl: Duration,
}

/// Login response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

impl SessionIssuer {
    pub fn new(jwt: Arc<Hs256Jwt>, ttl: Duration) -> Self {
        Self { jwt, ttl }
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<Session, JwtError> {
        let claims = JwtClaims::new(user.id(), user.name(), user.role(), now, self.ttl);
        Ok(Session {
            token: self.jwt.issue(&claims)?,
            expires_at: claims.expires_at,
            user: user.profile(),
        })
    }
}

#[cfg(test)]
mod tests {
    use wholesale_auth::{JwtValidator, NewUser, Role};
    use wholesale_core::UserId;

    use super::*;

    #[test]
    fn issued_session_carries_the_users_identity() {
        let jwt = Arc::new(Hs256Jwt::new(b"secret"));
        let issuer = SessionIssuer::new(Arc::clone(&jwt), Duration::hours(2));
        let now = Utc::now();
        let user = User::create(
            UserId::new(),
            NewUser {
                name: "Ravi".into(),
                email: "ravi@example.com".into(),
                password: "secret1".into(),
                role: Role::Clerk,
            },
            now,
        )
        .unwrap();

        let session = issuer.issue(&user, now).unwrap();
        assert_eq!(session.expires_at, now + Duration::hours(2));

        let claims = jwt.validate(&session.token, now).unwrap();
        assert_eq!(claims.principal(), user.principal());
    }
}
