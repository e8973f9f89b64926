//! Random password generation.
//!
//! Builds a character pool from the enabled classes and draws each
//! character uniformly from the shared cryptographically secure random
//! source. Rejection sampling keeps the draw unbiased.

use crate::rng::{OsRandom, RandomSource};
use cipherbox_common::Result;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Character classes to include in generated passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

impl PasswordOptions {
    fn pool(&self) -> Vec<u8> {
        let mut pool = Vec::new();
        if self.uppercase {
            pool.extend_from_slice(UPPERCASE);
        }
        if self.lowercase {
            pool.extend_from_slice(LOWERCASE);
        }
        if self.digits {
            pool.extend_from_slice(DIGITS);
        }
        if self.symbols {
            pool.extend_from_slice(SYMBOLS);
        }
        if pool.is_empty() {
            // All classes disabled: fall back to lowercase.
            pool.extend_from_slice(LOWERCASE);
        }
        pool
    }
}

/// Generate a random password using the operating system CSPRNG.
pub fn generate_password(length: usize, options: &PasswordOptions) -> Result<String> {
    generate_password_with(length, options, &mut OsRandom)
}

/// Generate a random password from an explicit randomness source.
pub fn generate_password_with(
    length: usize,
    options: &PasswordOptions,
    rng: &mut dyn RandomSource,
) -> Result<String> {
    let pool = options.pool();
    let mut password = String::with_capacity(length);
    for _ in 0..length {
        let index = uniform_index(rng, pool.len())?;
        password.push(pool[index] as char);
    }
    Ok(password)
}

/// Draw an index in `0..bound` uniformly from single random bytes.
///
/// Requires `bound <= 256`; the pools above are at most 88 entries.
fn uniform_index(rng: &mut dyn RandomSource, bound: usize) -> Result<usize> {
    debug_assert!(bound > 0 && bound <= 256);
    let limit = 256 - (256 % bound);
    loop {
        let mut byte = [0u8; 1];
        rng.fill(&mut byte)?;
        if (byte[0] as usize) < limit {
            return Ok(byte[0] as usize % bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic source that replays a scripted byte sequence.
    struct Scripted {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl RandomSource for Scripted {
        fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
            for b in dest.iter_mut() {
                *b = self.bytes[self.pos % self.bytes.len()];
                self.pos += 1;
            }
            Ok(())
        }
    }

    #[test]
    fn test_exact_length() {
        for length in [0, 1, 16, 64] {
            let password = generate_password(length, &PasswordOptions::default()).unwrap();
            assert_eq!(password.chars().count(), length);
        }
    }

    #[test]
    fn test_digits_only() {
        let options = PasswordOptions {
            uppercase: false,
            lowercase: false,
            digits: true,
            symbols: false,
        };
        let password = generate_password(64, &options).unwrap();
        assert!(password.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_symbols_only() {
        let options = PasswordOptions {
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: true,
        };
        let password = generate_password(64, &options).unwrap();
        assert!(password.bytes().all(|b| SYMBOLS.contains(&b)));
    }

    #[test]
    fn test_all_classes_disabled_falls_back_to_lowercase() {
        let options = PasswordOptions {
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
        };
        let password = generate_password(64, &options).unwrap();
        assert!(password.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_uniform_index_rejects_biased_bytes() {
        // Pool of 26: limit is 234, so bytes >= 234 must be skipped.
        let mut rng = Scripted {
            bytes: vec![255, 240, 10],
            pos: 0,
        };
        assert_eq!(uniform_index(&mut rng, 26).unwrap(), 10);
    }

    #[test]
    fn test_scripted_source_is_deterministic() {
        let options = PasswordOptions::default();
        let mut rng1 = Scripted { bytes: vec![3, 17, 50, 80], pos: 0 };
        let mut rng2 = Scripted { bytes: vec![3, 17, 50, 80], pos: 0 };

        let p1 = generate_password_with(20, &options, &mut rng1).unwrap();
        let p2 = generate_password_with(20, &options, &mut rng2).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_generated_passwords_differ() {
        let options = PasswordOptions::default();
        let p1 = generate_password(24, &options).unwrap();
        let p2 = generate_password(24, &options).unwrap();
        assert_ne!(p1, p2);
    }
}
