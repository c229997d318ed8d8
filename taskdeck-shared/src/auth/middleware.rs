//! Bearer authentication for request handling
//!
//! [`authenticate`] reads the `Authorization: Bearer <token>` header,
//! verifies the token and produces an [`AuthContext`]. The API layer runs it
//! from a middleware and inserts the context into the request extensions, so
//! handlers can take it with `Extension<AuthContext>`:
//!
//! ```
//! use axum::Extension;
//! use taskdeck_shared::auth::middleware::AuthContext;
//!
//! async fn handler(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("Hello, {}", auth.email)
//! }
//! ```

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{verify_token, Claims, JwtError};

/// Identity of the caller, decoded from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email asserted by the token
    pub email: String,
}

impl AuthContext {
    /// Creates auth context from verified claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }

    /// Whether the caller is the given user
    pub fn is_self(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Error type for bearer authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header on the request
    #[error("Token not sent")]
    MissingCredentials,

    /// Header present but not a usable bearer token, or the token failed
    /// signature/expiry checks
    #[error("Invalid or expired token")]
    InvalidToken(#[source] Option<JwtError>),
}

/// Extracts the raw token from an `Authorization: Bearer <token>` header
///
/// # Errors
///
/// - `AuthError::MissingCredentials` if the header is absent
/// - `AuthError::InvalidToken` if the header is not valid UTF-8, does not use
///   the `Bearer` scheme, or carries an empty token
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;

    let value = value.to_str().map_err(|_| AuthError::InvalidToken(None))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidToken(None))?;

    if token.is_empty() {
        return Err(AuthError::InvalidToken(None));
    }

    Ok(token)
}

/// Authenticates a request from its headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = verify_token(token, secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AuthError::InvalidToken(Some(e))
    })?;

    Ok(AuthContext::from_claims(claims))
}
