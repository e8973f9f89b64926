//! Key and salt types with secure memory handling.
//!
//! The derived key automatically zeroizes its memory on drop so that
//! key material does not persist after an operation completes.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::rng::RandomSource;
use cipherbox_common::Result;

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Length of key-derivation salts in bytes (128-bit).
pub const SALT_LENGTH: usize = 16;

/// Symmetric key derived from a password.
///
/// Exists only in memory for the lifetime of one encrypt/decrypt
/// operation and is never serialized.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Create a derived key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED])")
    }
}

/// Salt for key derivation.
///
/// Generated fresh for every encryption operation: one per text
/// encrypt call, one per whole-file encrypt. Not secret, so it is
/// safe to write into headers and envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt from the given randomness source.
    pub fn generate<R: RandomSource + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut salt = [0u8; SALT_LENGTH];
        rng.fill(&mut salt)?;
        Ok(Self(salt))
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::OsRandom;

    #[test]
    fn test_salt_generate_is_random() {
        let salt1 = Salt::generate(&mut OsRandom).unwrap();
        let salt2 = Salt::generate(&mut OsRandom).unwrap();

        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_derived_key_debug_is_redacted() {
        let key = DerivedKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "DerivedKey([REDACTED])");
    }
}
