//! Bearer token issuing and verification
//!
//! Tokens are HS256-signed JWTs carrying the user's identity. They are not
//! persisted and there is no server-side revocation: a token that passes
//! signature and expiry checks is trusted exactly as its payload asserts.
//!
//! # Claims
//!
//! - `sub`: user ID
//! - `email`: user email at the time of login
//! - `iat`: issued at (Unix seconds)
//! - `exp`: expiry (Unix seconds), one day after `iat` by default
//!
//! # Example
//!
//! ```
//! use taskdeck_shared::auth::jwt::{issue_token, verify_token};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = "a-secret-that-is-at-least-32-bytes-long";
//! let user_id = Uuid::new_v4();
//!
//! let token = issue_token(user_id, "ana@example.com", secret)?;
//! let claims = verify_token(&token, secret)?;
//! assert_eq!(claims.sub, user_id);
//! assert_eq!(claims.email, "ana@example.com");
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of a token issued at login
pub fn default_token_ttl() -> Duration {
    Duration::days(1)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature or format check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// User email
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims expiring after [`default_token_ttl`]
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self::with_expiration(user_id, email, default_token_ttl())
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative duration produces claims that are already expired, which
    /// is handy in tests.
    pub fn with_expiration(user_id: Uuid, email: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            email: email.into(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a compact JWT using HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a login token for a user with the default one-day lifetime
pub fn issue_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(user_id, email), secret)
}

/// Verifies a token's signature and expiry and returns its claims
///
/// Expiry is checked with zero leeway.
///
/// # Errors
///
/// - `JwtError::Expired` if `exp` is in the past
/// - `JwtError::ValidationError` for bad signatures or malformed tokens
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_default_lifetime_is_one_day() {
        let claims = Claims::new(Uuid::new_v4(), "a@example.com");

        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "ana@example.com", SECRET).unwrap();

        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn test_verify_with_wrong_secret_fails() {
        let token = issue_token(Uuid::new_v4(), "a@example.com", SECRET).unwrap();

        let result = verify_token(&token, "another-secret-key-at-least-32-bytes");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "a@example.com", Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(verify_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_recently_expired_token_is_rejected_without_leeway() {
        let claims = Claims::with_expiration(Uuid::new_v4(), "a@example.com", Duration::seconds(-5));
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(verify_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not.a.jwt", SECRET).is_err());
        assert!(verify_token("", SECRET).is_err());
    }
}
