use bcrypt::{hash, verify};

use crate::error::Result;

/// bcrypt password hashing with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        Ok(hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        Ok(verify(password, password_hash)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext_and_verifies() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash("pw1").unwrap();

        assert_ne!(hashed, "pw1");
        assert!(hasher.verify("pw1", &hashed).unwrap());
        assert!(!hasher.verify("pw2", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new(4);
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = PasswordHasher::new(4);
        assert!(hasher.verify("pw1", "not-a-bcrypt-hash").is_err());
    }
}
