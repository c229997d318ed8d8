//! Password digests using Argon2id
//!
//! Passwords are never stored in plaintext. Each digest is a PHC string that
//! embeds the algorithm, parameters and a random 16-byte salt, so verification
//! needs nothing but the stored string.
//!
//! # Parameters
//!
//! - **Algorithm**: Argon2id, version 0x13
//! - **Memory**: 64 MB (65536 KB)
//! - **Iterations**: 3 passes
//! - **Parallelism**: 4 lanes
//! - **Output**: 32-byte hash
//!
//! Hashing is CPU and memory heavy. Request handlers should use the async
//! variants ([`hash`] and [`verify`]), which move the work onto Tokio's
//! blocking pool.
//!
//! # Example
//!
//! ```
//! use taskdeck_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let digest = hash_password("123456")?;
//! assert!(verify_password("123456", &digest)?);
//! assert!(!verify_password("654321", &digest)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};

const MEMORY_KIB: u32 = 65536;
const ITERATIONS: u32 = 3;
const LANES: u32 = 4;
const OUTPUT_LEN: usize = 32;

/// Error type for password digest operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored digest is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// The blocking task running the hash was cancelled or panicked
    #[error("Password worker failed: {0}")]
    WorkerFailed(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_KIB)
        .t_cost(ITERATIONS)
        .p_cost(LANES)
        .output_len(OUTPUT_LEN)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password into an Argon2id PHC string with a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let digest = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(digest.to_string())
}

/// Verifies a password against a stored digest
///
/// Returns `Ok(false)` on mismatch. The comparison is constant-time.
///
/// # Errors
///
/// Returns an error if the stored digest cannot be parsed or verification
/// fails for a reason other than a mismatch.
pub fn verify_password(password: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed.hash.is_none() {
        return Err(PasswordError::InvalidHash("Hash has no digest".to_string()));
    }

    // Parameters are read back from the PHC string
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Async wrapper around [`hash_password`] that runs on the blocking pool
pub async fn hash(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))?
}

/// Async wrapper around [`verify_password`] that runs on the blocking pool
pub async fn verify(password: String, digest: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|e| PasswordError::WorkerFailed(e.to_string()))?
}
