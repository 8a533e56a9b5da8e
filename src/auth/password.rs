//! This file defines types that handle password salting and hashing.
//! `Salt` is a random, per-user, hex-encoded string.
//! `PasswordHash` is the hex-encoded SHA-256 digest of the salt followed by the password.

use std::fmt::Display;

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The number of random bytes in a freshly generated [Salt].
pub const SALT_LENGTH: usize = 16;

/// A random, hex-encoded salt that is stored alongside a user's password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Salt(String);

impl Salt {
    /// Generate a new salt from [SALT_LENGTH] random bytes.
    pub fn generate() -> Self {
        let bytes: [u8; SALT_LENGTH] = rand::thread_rng().r#gen();

        Self(hex::encode(bytes))
    }

    /// Create a new `Salt` from a string previously produced by [Salt::generate].
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because
    /// if an invalid salt is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_salt: &str) -> Self {
        Self(raw_salt.to_owned())
    }
}

impl AsRef<str> for Salt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A salted and hashed password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `raw_password` with `salt`.
    ///
    /// The digest covers the salt string followed by the password.
    pub fn new(raw_password: &str, salt: &Salt) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_ref().as_bytes());
        hasher.update(raw_password.as_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// Create a new `PasswordHash` without any validation.
    ///
    /// The caller should ensure that `raw_password_hash` is a valid password hash.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if an invalid hash is provided it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Check that `raw_password` hashed with `salt` matches the stored password hash.
    ///
    /// The comparison takes the same time regardless of where the hashes differ.
    pub fn verify(&self, raw_password: &str, salt: &Salt) -> bool {
        let candidate = Self::new(raw_password, salt);

        self.0.len() == candidate.0.len()
            && self
                .0
                .bytes()
                .zip(candidate.0.bytes())
                .fold(0u8, |difference, (left, right)| difference | (left ^ right))
                == 0
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::{PasswordHash, SALT_LENGTH, Salt};

    #[test]
    fn generated_salt_is_hex_encoded() {
        let salt = Salt::generate();

        assert_eq!(salt.as_ref().len(), SALT_LENGTH * 2);
        assert!(salt.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }

    #[test]
    fn hash_is_digest_of_salt_then_password() {
        let salt = Salt::new_unchecked("abcd");
        let want = hex::encode(Sha256::digest(b"abcdhunter2"));

        let got = PasswordHash::new("hunter2", &salt);

        assert_eq!(got.as_ref(), want);
    }

    #[test]
    fn verify_succeeds_with_correct_password() {
        let salt = Salt::generate();
        let hash = PasswordHash::new("hunter2", &salt);

        assert!(hash.verify("hunter2", &salt));
    }

    #[test]
    fn verify_fails_with_wrong_password_or_salt() {
        let salt = Salt::generate();
        let hash = PasswordHash::new("hunter2", &salt);

        assert!(!hash.verify("hunter3", &salt));
        assert!(!hash.verify("hunter2", &Salt::generate()));
    }
}
