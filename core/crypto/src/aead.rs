//! Authenticated encryption using AES-256-GCM.
//!
//! Every call takes an explicit 96-bit nonce supplied by the caller;
//! the streaming layer generates a fresh one per chunk and the text
//! layer one per operation. A nonce must never repeat under the same
//! key.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::keys::DerivedKey;
use crate::rng::RandomSource;
use cipherbox_common::{Error, Result};

/// Nonce size for AES-GCM (12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size (16 bytes), appended to the ciphertext.
pub const TAG_SIZE: usize = 16;

/// Generate a fresh random nonce.
pub fn generate_nonce<R: RandomSource + ?Sized>(rng: &mut R) -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill(&mut nonce)?;
    Ok(nonce)
}

/// Encrypt plaintext, returning ciphertext with the tag appended.
///
/// # Errors
/// Fails only if the AEAD primitive itself fails, which indicates a
/// platform problem and is fatal to the operation.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::KeyDerivationUnavailable("AEAD encryption failed".to_string()))
}

/// Decrypt ciphertext (with appended tag), verifying authenticity.
///
/// # Errors
/// Any tag-verification failure maps to [`Error::DecryptionFailed`];
/// wrong password and tampered data are not distinguished.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KEY_LENGTH;

    fn test_key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let key = test_key(42);
        let nonce = [7u8; NONCE_SIZE];

        let ciphertext = seal(&key, &nonce, b"Hello, World!").unwrap();
        let plaintext = open(&key, &nonce, &ciphertext).unwrap();

        assert_eq!(plaintext, b"Hello, World!");
    }

    #[test]
    fn test_ciphertext_includes_tag() {
        let key = test_key(42);
        let nonce = [7u8; NONCE_SIZE];

        let ciphertext = seal(&key, &nonce, b"Test message").unwrap();
        assert_eq!(ciphertext.len(), b"Test message".len() + TAG_SIZE);
    }

    #[test]
    fn test_wrong_key_fails() {
        let nonce = [7u8; NONCE_SIZE];
        let ciphertext = seal(&test_key(1), &nonce, b"Secret data").unwrap();

        let result = open(&test_key(2), &nonce, &ciphertext);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_wrong_nonce_fails() {
        let key = test_key(42);
        let ciphertext = seal(&key, &[1u8; NONCE_SIZE], b"Secret data").unwrap();

        let result = open(&key, &[2u8; NONCE_SIZE], &ciphertext);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key(42);
        let nonce = [7u8; NONCE_SIZE];

        let mut ciphertext = seal(&key, &nonce, b"Important data").unwrap();
        ciphertext[5] ^= 0x01;

        let result = open(&key, &nonce, &ciphertext);
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = test_key(42);
        let nonce = [7u8; NONCE_SIZE];

        let ciphertext = seal(&key, &nonce, b"").unwrap();
        assert_eq!(ciphertext.len(), TAG_SIZE);

        let plaintext = open(&key, &nonce, &ciphertext).unwrap();
        assert!(plaintext.is_empty());
    }
}
