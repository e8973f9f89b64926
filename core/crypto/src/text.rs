//! Single-shot text encryption.
//!
//! Encrypts an in-memory string in one AEAD call, with a fresh salt
//! and nonce per operation, and packages the result as three
//! independently base64-encoded fields. Transport of the envelope
//! (JSON bundling etc.) is left to the caller.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::aead::{self, NONCE_SIZE};
use crate::kdf::{derive_key, KdfParams};
use crate::keys::{Salt, SALT_LENGTH};
use crate::rng::{OsRandom, RandomSource};
use cipherbox_common::{Error, Result};

/// Encrypted text envelope: ciphertext (with appended tag), salt, and
/// nonce, each base64-encoded.
///
/// Both directions speak this one struct; there is no alternative
/// combined-blob form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEnvelope {
    /// Base64-encoded ciphertext including the authentication tag.
    pub ciphertext: String,
    /// Base64-encoded 16-byte salt.
    pub salt: String,
    /// Base64-encoded 12-byte nonce.
    pub nonce: String,
}

/// Encrypt a string with a password, using default KDF parameters and
/// the operating system CSPRNG.
pub fn encrypt_text(plaintext: &str, password: &str) -> Result<TextEnvelope> {
    encrypt_text_with(plaintext, password, &KdfParams::default(), &mut OsRandom)
}

/// Encrypt a string with explicit KDF parameters and randomness source.
pub fn encrypt_text_with(
    plaintext: &str,
    password: &str,
    params: &KdfParams,
    rng: &mut dyn RandomSource,
) -> Result<TextEnvelope> {
    let salt = Salt::generate(rng)?;
    let nonce = aead::generate_nonce(rng)?;
    let key = derive_key(password, &salt, params);

    let ciphertext = aead::seal(&key, &nonce, plaintext.as_bytes())?;

    Ok(TextEnvelope {
        ciphertext: BASE64.encode(ciphertext),
        salt: BASE64.encode(salt.as_bytes()),
        nonce: BASE64.encode(nonce),
    })
}

/// Decrypt an envelope with a password, using default KDF parameters.
pub fn decrypt_text(envelope: &TextEnvelope, password: &str) -> Result<String> {
    decrypt_text_with(envelope, password, &KdfParams::default())
}

/// Decrypt an envelope with explicit KDF parameters.
///
/// # Errors
/// Malformed envelope fields, tag-verification failure, and invalid
/// UTF-8 in the recovered plaintext all map to
/// [`Error::DecryptionFailed`]; the cause is not distinguished.
pub fn decrypt_text_with(
    envelope: &TextEnvelope,
    password: &str,
    params: &KdfParams,
) -> Result<String> {
    let salt_bytes: [u8; SALT_LENGTH] = BASE64
        .decode(&envelope.salt)
        .map_err(|_| Error::DecryptionFailed)?
        .try_into()
        .map_err(|_| Error::DecryptionFailed)?;
    let nonce: [u8; NONCE_SIZE] = BASE64
        .decode(&envelope.nonce)
        .map_err(|_| Error::DecryptionFailed)?
        .try_into()
        .map_err(|_| Error::DecryptionFailed)?;
    let ciphertext = BASE64
        .decode(&envelope.ciphertext)
        .map_err(|_| Error::DecryptionFailed)?;

    let key = derive_key(password, &Salt::from_bytes(salt_bytes), params);
    let plaintext = aead::open(&key, &nonce, &ciphertext)?;

    String::from_utf8(plaintext).map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::TAG_SIZE;

    fn fast_params() -> KdfParams {
        KdfParams::new(1_000).unwrap()
    }

    fn encrypt(plaintext: &str, password: &str) -> TextEnvelope {
        encrypt_text_with(plaintext, password, &fast_params(), &mut OsRandom).unwrap()
    }

    #[test]
    fn test_text_roundtrip() {
        let envelope = encrypt("attack at dawn", "hunter2");
        let plaintext = decrypt_text_with(&envelope, "hunter2", &fast_params()).unwrap();

        assert_eq!(plaintext, "attack at dawn");
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let envelope = encrypt("", "hunter2");
        let plaintext = decrypt_text_with(&envelope, "hunter2", &fast_params()).unwrap();

        assert_eq!(plaintext, "");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let envelope = encrypt("héllo wörld \u{1F512}", "pw");
        let plaintext = decrypt_text_with(&envelope, "pw", &fast_params()).unwrap();

        assert_eq!(plaintext, "héllo wörld \u{1F512}");
    }

    #[test]
    fn test_wrong_password_fails() {
        let envelope = encrypt("secret", "right-password");

        let result = decrypt_text_with(&envelope, "wrong-password", &fast_params());
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_fresh_salt_and_nonce_per_call() {
        let env1 = encrypt("same message", "same password");
        let env2 = encrypt("same message", "same password");

        assert_ne!(env1.salt, env2.salt);
        assert_ne!(env1.nonce, env2.nonce);
        assert_ne!(env1.ciphertext, env2.ciphertext);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let envelope = encrypt("payload", "pw");

        let mut raw = BASE64.decode(&envelope.ciphertext).unwrap();
        raw[0] ^= 0x80;
        let tampered = TextEnvelope {
            ciphertext: BASE64.encode(raw),
            ..envelope
        };

        let result = decrypt_text_with(&tampered, "pw", &fast_params());
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_malformed_base64_fails() {
        let mut envelope = encrypt("payload", "pw");
        envelope.salt = "not base64!!!".to_string();

        let result = decrypt_text_with(&envelope, "pw", &fast_params());
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_hello_scenario_field_sizes() {
        // 5-byte plaintext: salt decodes to 16 bytes, nonce to 12, and
        // the ciphertext to at least plaintext + tag.
        let envelope = encrypt("hello", "correct-horse");

        assert_eq!(BASE64.decode(&envelope.salt).unwrap().len(), 16);
        assert_eq!(BASE64.decode(&envelope.nonce).unwrap().len(), 12);
        assert!(BASE64.decode(&envelope.ciphertext).unwrap().len() >= 5 + TAG_SIZE);

        let plaintext = decrypt_text_with(&envelope, "correct-horse", &fast_params()).unwrap();
        assert_eq!(plaintext, "hello");

        let result = decrypt_text_with(&envelope, "wrong-pass", &fast_params());
        assert!(matches!(result, Err(Error::DecryptionFailed)));
    }

    #[test]
    fn test_envelope_json_roundtrip() {
        let envelope = encrypt("json me", "pw");

        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: TextEnvelope = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, envelope);
        let plaintext = decrypt_text_with(&parsed, "pw", &fast_params()).unwrap();
        assert_eq!(plaintext, "json me");
    }
}
