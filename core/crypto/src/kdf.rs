//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! An iterated SHA-256-based PBKDF makes brute-forcing a password
//! costly. Derivation is deterministic given identical password, salt,
//! and parameters.

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::keys::{DerivedKey, Salt, KEY_LENGTH};
use cipherbox_common::{Error, Result};

/// Default PBKDF2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Parameters for PBKDF2 key derivation.
///
/// The iteration count is not recorded in the wire format or the text
/// envelope, so decryption must be configured with the same parameters
/// that were used to encrypt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    /// Number of PBKDF2 iterations.
    pub iterations: u32,
}

impl KdfParams {
    /// Create parameters with an explicit iteration count.
    ///
    /// # Errors
    /// Rejects a zero iteration count.
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::InvalidInput(
                "KDF iteration count must be positive".to_string(),
            ));
        }
        Ok(Self { iterations })
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 256-bit key from a password and salt.
///
/// The password is read once, never stored or logged, and the derived
/// key zeroizes itself on drop.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> DerivedKey {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut key,
    );
    DerivedKey::from_bytes(key)
}
