//! Password hashing and verification.
//!
//! Argon2id with fixed cost parameters. Every hash carries its own random
//! salt, so two hashes of the same plaintext never compare equal; the stored
//! PHC string records the salt and parameters it was created with.
//! Verification recomputes the derivation and compares digests in constant
//! time inside the `password_hash` stack; a malformed stored hash verifies
//! as `false` rather than erroring.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use thiserror::Error;
use tracing::error;

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_CHARS: usize = 12;

// Cost constants sized for roughly 100ms per derivation on current server
// hardware. Raising them later does not invalidate stored hashes.
const MEMORY_COST_KIB: u32 = 19_456;
const ITERATIONS: u32 = 2;
const LANES: u32 = 1;

/// Error types for password hashing
#[derive(Debug, Error)]
pub enum HashError {
    #[error("password must be at least {0} characters")]
    WeakInput(usize),

    #[error("failed to derive password hash")]
    Hashing,
}

/// One-way salted password hasher.
///
/// Cheap to clone; the cost parameters are the only state. Both operations
/// block the calling thread for the configured cost, so async callers run
/// them under `tokio::task::spawn_blocking`.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, ITERATIONS, LANES, None)
            .expect("fixed Argon2 cost constants are valid");
        Self { params }
    }

    fn argon(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Derives a salted hash of `plaintext`.
    ///
    /// # Errors
    /// * `HashError::WeakInput` - plaintext is shorter than [`MIN_PASSWORD_CHARS`]
    /// * `HashError::Hashing` - the derivation itself failed
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.chars().count() < MIN_PASSWORD_CHARS {
            return Err(HashError::WeakInput(MIN_PASSWORD_CHARS));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| {
                error!("password hash derivation failed: {}", e);
                HashError::Hashing
            })?;

        Ok(hash.to_string())
    }

    /// Checks `plaintext` against a stored hash.
    ///
    /// Returns `false` both for a mismatch and for a stored value that is
    /// not a parseable PHC string.
    pub fn verify(&self, plaintext: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };

        self.argon()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}
