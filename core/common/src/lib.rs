//! Common types shared across Cipherbox crates.
//!
//! This crate provides the error taxonomy used by the encryption
//! engine and the tools built on top of it.

pub mod error;

pub use error::{Error, Result};
