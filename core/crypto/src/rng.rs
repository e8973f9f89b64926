//! Randomness as an injected capability.
//!
//! Salts, nonces, and generated passwords all draw from a
//! [`RandomSource`] rather than an ambient global, so tests can
//! substitute a deterministic source. Production code uses
//! [`OsRandom`], backed by the operating system CSPRNG.

use rand::rngs::OsRng;
use rand::RngCore;

use cipherbox_common::{Error, Result};

/// Source of cryptographically secure random bytes.
pub trait RandomSource {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    /// Fails only if the underlying generator is unavailable, which
    /// is fatal to the calling operation.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::KeyDerivationUnavailable(format!("system RNG failure: {}", e)))
    }
}
