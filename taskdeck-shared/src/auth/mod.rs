//! Authentication utilities
//!
//! # Modules
//!
//! - [`password`]: Argon2id password digests
//! - [`jwt`]: bearer token issuing and verification
//! - [`middleware`]: `Authorization` header parsing and the request [`middleware::AuthContext`]
//!
//! # Example
//!
//! ```no_run
//! use taskdeck_shared::auth::{jwt, password};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let digest = password::hash_password("user_password")?;
//! assert!(password::verify_password("user_password", &digest)?);
//!
//! let token = jwt::issue_token(Uuid::new_v4(), "user@example.com", "secret-key")?;
//! # Ok(())
//! # }
//! ```

pub mod jwt;
pub mod middleware;
pub mod password;
