//! Access-token verification against the identity provider's signing secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::errors::AuthResult;
use super::models::AccessTokenClaims;
use crate::game::entities::UserId;

/// Verifies access tokens minted by the identity provider.
#[derive(Clone)]
pub struct AuthManager {
    jwt_secret: String,
}

impl AuthManager {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
        }
    }

    /// Verify an access token and return its claims.
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Mint an access token. Issuing belongs to the identity provider in
    /// production; this exists for tests and operator tooling.
    pub fn issue_access_token(
        &self,
        user_id: UserId,
        username: &str,
        ttl: Duration,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_round_trip() {
        let manager = AuthManager::new("test-secret-test-secret-test-secret");

        let token = manager
            .issue_access_token(42, "alice", Duration::minutes(15))
            .unwrap();
        let claims = manager.verify_access_token(&token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let manager = AuthManager::new("test-secret-test-secret-test-secret");
        let other = AuthManager::new("other-secret-other-secret-other-sec");

        let token = other
            .issue_access_token(42, "alice", Duration::minutes(15))
            .unwrap();

        assert!(manager.verify_access_token(&token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let manager = AuthManager::new("test-secret-test-secret-test-secret");

        let token = manager
            .issue_access_token(42, "alice", Duration::hours(-1))
            .unwrap();

        assert!(manager.verify_access_token(&token).is_err());
    }
}
