//! Common error types for Cipherbox.

use thiserror::Error;

/// Top-level error type for Cipherbox operations.
///
/// Every failure aborts the in-flight operation; nothing is retried
/// internally. The `DecryptionFailed` message is deliberately fixed:
/// wrong password and tampered ciphertext are cryptographically
/// indistinguishable and must stay that way in user-visible output,
/// including never reporting the offset or chunk that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform's cryptographic capability (CSPRNG or primitive
    /// setup) is unavailable. Fatal.
    #[error("key derivation unavailable: {0}")]
    KeyDerivationUnavailable(String),

    /// Authentication tag verification failed: wrong password or
    /// corrupted ciphertext, intentionally indistinguishable.
    #[error("decryption failed: invalid password or corrupted data")]
    DecryptionFailed,

    /// The encrypted stream ended before a complete header or frame
    /// could be read, or its plaintext total did not add up.
    #[error("truncated stream: encrypted data ended unexpectedly")]
    TruncatedStream,

    /// Reading from the underlying byte source failed. Fatal to the
    /// in-flight operation.
    #[error("source read failed: {0}")]
    SourceRead(#[from] std::io::Error),

    /// Invalid input provided by the caller.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
