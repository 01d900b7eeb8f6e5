//! Argon2id credential hashing.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use keydesk_core::error::AppError;
use keydesk_core::result::AppResult;

/// Hashes and verifies console credentials.
///
/// Both the admin secret and manager passwords are kept as Argon2id
/// hashes; verification runs the full KDF, so comparisons do not leak
/// timing about the stored value.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a hasher.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext credential with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::internal(format!("Credential hashing failed: {e}")))
    }

    /// Verifies a plaintext credential against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only for a malformed hash.
    pub fn verify(&self, plaintext: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid credential hash: {e}")))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Credential verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("780431").unwrap();
        assert!(hasher.verify("780431", &hash).unwrap());
        assert!(!hasher.verify("780432", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = PasswordHasher::new();
        assert!(hasher.verify("x", "not-a-hash").is_err());
    }
}
