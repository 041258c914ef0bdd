/// Password Hashing and Verification
///
/// Salted bcrypt hashing for login passwords and for refresh tokens at rest.
/// Both operations are CPU-heavy on purpose, so the async variants run them
/// on the blocking thread pool.
///
/// bcrypt ignores everything past 72 bytes of input. Long passwords and
/// refresh tokens (JWTs) would collide on a shared prefix, so every secret is
/// reduced to its hex SHA-256 digest first and that digest is what bcrypt
/// sees.

use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};

use crate::configuration::MIN_PASSWORD_HASH_COST;
use crate::error::AppError;

/// Hex SHA-256 of the secret, 64 bytes regardless of input length
fn prehash(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Costs below the minimum are raised to it
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.max(MIN_PASSWORD_HASH_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a secret with a fresh salt
    ///
    /// # Errors
    /// Returns error if bcrypt hashing fails
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        hash(prehash(plaintext), self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Check a secret against a stored bcrypt hash
    ///
    /// # Errors
    /// Returns error if the stored hash is malformed
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AppError> {
        verify(prehash(plaintext), digest)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
    }

    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    pub async fn verify_blocking(&self, plaintext: String, digest: String) -> Result<bool, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
    }
}
