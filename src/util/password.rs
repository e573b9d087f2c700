//! bcrypt password hashing for user accounts.

use bcrypt::{DEFAULT_COST, hash, verify};
use thiserror::Error;

/// Lowest cost bcrypt accepts; lower requested costs use the library default.
pub const MIN_COST: u32 = 4;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hash failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password is empty")]
    Empty,
}

pub fn hash_password(raw: &str, cost: u32) -> Result<String, PasswordError> {
    if raw.is_empty() {
        return Err(PasswordError::Empty);
    }
    let cost = if cost < MIN_COST { DEFAULT_COST } else { cost };
    Ok(hash(raw, cost)?)
}

/// A stored hash that bcrypt cannot parse counts as a mismatch.
pub fn verify_password(raw: &str, hashed: &str) -> Result<bool, PasswordError> {
    if raw.is_empty() {
        return Err(PasswordError::Empty);
    }
    match verify(raw, hashed) {
        Ok(matched) => Ok(matched),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is unreadable");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hashed = hash_password("kidung-jemaat", MIN_COST).expect("hash");
        assert!(verify_password("kidung-jemaat", &hashed).unwrap());
        assert!(!verify_password("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn empty_password_is_rejected() {
        assert!(matches!(hash_password("", MIN_COST), Err(PasswordError::Empty)));
        assert!(matches!(verify_password("", "$2b$04$x"), Err(PasswordError::Empty)));
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        assert!(!verify_password("secret-secret", "not-a-bcrypt-hash").unwrap());
    }
}
