//! HS256 bearer token verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::errors::{AuthError, AuthResult};
use super::models::{Claims, Principal};
use crate::pool::models::UserId;

/// Verifies platform-issued access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Decode and validate a token into the calling principal
    pub fn verify(&self, token: &str) -> AuthResult<Principal> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.sub <= 0 {
            return Err(AuthError::InvalidSubject);
        }
        Ok(data.claims.into())
    }

    /// Issue a token; used by tooling and tests that stand in for the identity service
    pub fn issue(&self, user_id: UserId, is_admin: bool, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            is_admin,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    #[test]
    fn test_issue_then_verify() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue(42, true, Duration::minutes(5)).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), Principal::admin(42));
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let token = TokenVerifier::new("another-secret-another-secret-another")
            .issue(42, false, Duration::minutes(5))
            .unwrap();
        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert_eq!(err.client_message(), "Authentication failed");
    }

    #[test]
    fn test_rejects_expired_token() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue(42, false, Duration::hours(-1)).unwrap();
        let err = verifier.verify(&token).unwrap_err();
        assert_eq!(err.client_message(), "Token expired");
    }

    #[test]
    fn test_rejects_non_positive_subject() {
        let verifier = TokenVerifier::new(SECRET);
        let token = verifier.issue(0, false, Duration::minutes(5)).unwrap();
        assert!(matches!(verifier.verify(&token), Err(AuthError::InvalidSubject)));
    }
}
