//! Password hashing and verification using Argon2id
//!
//! Hashes are stored as PHC strings, so verification reads the parameters
//! back from the hash and works regardless of the current configuration.
//!
//! # Example
//!
//! ```rust
//! use taxi_fleet::auth::{PasswordHashConfig, PasswordHasher, verify_password};
//!
//! # fn example() -> anyhow::Result<()> {
//! let hasher = PasswordHasher::with_config(PasswordHashConfig {
//!     memory_cost: 8 * 1024,
//!     iterations: 1,
//!     ..PasswordHashConfig::default()
//! })?;
//!
//! let hash = hasher.hash("user12test")?;
//! assert!(verify_password("user12test", &hash)?);
//! assert!(!verify_password("wrong", &hash)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Invalid parameters for Argon2
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
}

/// Configuration for Argon2id password hashing
///
/// Defaults follow the OWASP recommendation for server-side hashing:
/// 19 MiB memory, 2 iterations, 1 lane, 32 byte output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,

    /// Number of iterations
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,

    /// Output hash length in bytes
    pub output_length: usize,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            iterations: 2,
            parallelism: 1,
            output_length: 32,
        }
    }
}

impl PasswordHashConfig {
    fn params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.iterations,
            self.parallelism,
            Some(self.output_length),
        )
        .map_err(|e| PasswordError::InvalidParams(e.to_string()))
    }
}

/// Password hasher using Argon2id
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    config: PasswordHashConfig,
}

impl PasswordHasher {
    /// Create a password hasher with custom configuration
    ///
    /// # Errors
    ///
    /// Returns error if the Argon2 parameters are out of range
    pub fn with_config(config: PasswordHashConfig) -> Result<Self, PasswordError> {
        config.params()?;
        Ok(Self { config })
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, self.config.params()?);

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }
}

/// Verify a password against a stored PHC hash
///
/// Uses constant-time comparison. A wrong password is `Ok(false)`; only a
/// malformed hash or an internal failure is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}
