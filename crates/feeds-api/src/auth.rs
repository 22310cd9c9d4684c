use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use feeds_core::{FeedsError, Result};
use feeds_types::api::Claims;

/// Issues and verifies HS256 access tokens signed with the service secret.
pub struct Authenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    pub fn issue(&self, did: &str, name: &str, email: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
        let claims = Claims {
            sub: did.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            exp: (chrono::Utc::now() + ttl).timestamp().max(0) as usize,
        };

        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Check signature and expiry. Any failure is reported as an expired token so the
    /// peer signs in again.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected access token: {}", e);
                FeedsError::AccessTokenExpired
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let auth = Authenticator::new("test-secret");
        let token = auth
            .issue("did:elastos:alice", "alice", "a@example.com", chrono::Duration::hours(1))
            .unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "did:elastos:alice");
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let auth = Authenticator::new("test-secret");
        let expired = auth
            .issue("did:elastos:alice", "alice", "", chrono::Duration::hours(-2))
            .unwrap();
        assert!(matches!(auth.verify(&expired), Err(FeedsError::AccessTokenExpired)));

        let foreign = Authenticator::new("other-secret")
            .issue("did:elastos:alice", "alice", "", chrono::Duration::hours(1))
            .unwrap();
        assert!(matches!(auth.verify(&foreign), Err(FeedsError::AccessTokenExpired)));
        assert!(matches!(auth.verify("garbage"), Err(FeedsError::AccessTokenExpired)));
    }
}
