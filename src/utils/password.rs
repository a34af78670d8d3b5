// Password hashing and verification using bcrypt.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("failed to verify password: {0}")]
    Verification(String),
}

/// Hash a password with bcrypt at the configured work factor (≥ 12).
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// Constant-time verification against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::Verification(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("pass1234", 12).unwrap();
        assert!(verify_password("pass1234", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = hash_password("pass1234", 12).unwrap();
        let b = hash_password("pass1234", 12).unwrap();
        assert_ne!(a, b);
    }
}
