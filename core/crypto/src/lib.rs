//! Cryptographic engine for Cipherbox.
//!
//! This crate provides:
//! - Password-based key derivation (PBKDF2-HMAC-SHA256)
//! - Single-shot authenticated text encryption (AES-256-GCM)
//! - Streaming file encryption over an authenticated frame format
//! - Cryptographically secure password generation
//!
//! # Security Guarantees
//! - Derived keys are zeroized on drop and never serialized
//! - Salts and nonces are fresh per operation; nonces are fresh per
//!   chunk on the streaming path
//! - Authentication failures never reveal whether the password was
//!   wrong or the data corrupted
//! - No key material, password, or plaintext is ever logged

pub mod aead;
pub mod kdf;
pub mod keys;
pub mod password;
pub mod rng;
pub mod stream;
pub mod text;

pub use kdf::{derive_key, KdfParams, DEFAULT_ITERATIONS};
pub use keys::{DerivedKey, Salt, KEY_LENGTH, SALT_LENGTH};
pub use password::{generate_password, PasswordOptions};
pub use rng::{OsRandom, RandomSource};
pub use stream::{
    decrypt_bytes, encrypt_bytes, DecryptStream, EncryptStream, StreamOptions,
    DEFAULT_CHUNK_SIZE,
};
pub use text::{decrypt_text, encrypt_text, TextEnvelope};
