//! Password Hashing and Verification
//!
//! Passwords are hashed with bcrypt at a fixed work factor. Each hash carries its own
//! random salt, so two hashes of the same password never compare equal and must only
//! be checked through `verify`.

use thiserror::Error;

/// Work factor used for every hash produced by this service.
pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    /// The hashing primitive failed while computing a new hash.
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
    /// The password does not match, or the stored hash is unusable.
    #[error("password does not match")]
    Mismatch,
}

/// Swappable one-way password hashing algorithm
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;

    /// Check `password` against a hash previously produced by `hash`.
    ///
    /// A stored hash in an unknown format is reported as `Mismatch`.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<(), PasswordError>;
}

/// bcrypt-backed hasher
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(PASSWORD_HASH_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        bcrypt::hash(password, self.cost).map_err(|e| {
            tracing::error!(error = %e, "bcrypt hashing failed");
            PasswordError::HashingFailure(e.to_string())
        })
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<(), PasswordError> {
        match bcrypt::verify(password, stored_hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::Mismatch),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                Err(PasswordError::Mismatch)
            }
        }
    }
}

/// Hash a password with the default bcrypt hasher
///
/// # Errors
/// Returns `HashingFailure` if bcrypt cannot produce a hash
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    BcryptHasher::default().hash(password)
}

/// Verify a password against its stored hash
///
/// # Errors
/// Returns `Mismatch` for a wrong password or a malformed hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), PasswordError> {
    BcryptHasher::default().verify(password, stored_hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "04234";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        // Hash should start with bcrypt identifier and carry the configured cost
        assert!(hash.starts_with("$2"));
        assert!(hash.contains("$10$"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct horse").expect("Failed to hash password");

        assert!(verify_password("correct horse", &hash).is_ok());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct horse").expect("Failed to hash password");

        assert_eq!(
            verify_password("battery staple", &hash),
            Err(PasswordError::Mismatch)
        );
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();

        assert_ne!(first, second);
        assert!(verify_password("same-password", &first).is_ok());
        assert!(verify_password("same-password", &second).is_ok());
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        for stored in ["", "not-a-hash", "$9z$10$abcdefghijklmnopqrstuv"] {
            assert_eq!(
                verify_password("anything", stored),
                Err(PasswordError::Mismatch),
                "stored hash {:?} should be a mismatch",
                stored
            );
        }
    }

    #[test]
    fn test_hasher_trait_object() {
        let hasher: Box<dyn PasswordHasher> = Box::new(BcryptHasher::new(4));
        let hash = hasher.hash("low-cost").unwrap();

        assert!(hash.contains("$04$"));
        assert!(hasher.verify("low-cost", &hash).is_ok());
    }
}
