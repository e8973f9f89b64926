//! Streaming encryption for large files.
//!
//! Handles byte streams of unbounded size by encrypting fixed-size
//! plaintext chunks, each independently authenticated under its own
//! fresh nonce. Both directions are lazy pull-based iterators: no work
//! happens beyond header handling until the consumer asks for the next
//! item, and cancellation is simply dropping the stream. The engine
//! never owns the underlying source; closing it is the caller's job.
//!
//! # Wire format (big-endian throughout)
//!
//! ```text
//! Stream := Header Frame*
//! Header := Salt(16) TotalSizeHi(4) TotalSizeLo(4)
//! Frame  := Nonce(12) CiphertextLen(4) Ciphertext(CiphertextLen)
//! ```
//!
//! The ciphertext of each frame includes the appended authentication
//! tag. Frame order is plaintext order; there is no reordering and no
//! parallel frame processing.

use std::io::{ErrorKind, Read};

use crate::aead::{self, NONCE_SIZE};
use crate::kdf::{derive_key, KdfParams};
use crate::keys::{DerivedKey, Salt, SALT_LENGTH};
use crate::rng::{OsRandom, RandomSource};
use cipherbox_common::{Error, Result};

/// Default plaintext chunk size for streaming encryption (64 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Stream header size: salt (16) + total plaintext size (8).
pub const HEADER_SIZE: usize = SALT_LENGTH + 8;

/// Frame prefix size: nonce (12) + ciphertext length (4).
pub const FRAME_PREFIX_SIZE: usize = NONCE_SIZE + 4;

/// Size of reads issued against the underlying source on decrypt.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Progress callback, invoked with a percentage in `0.0..=100.0`.
pub type ProgressFn = Box<dyn FnMut(f64)>;

/// Options shared by both streaming directions.
///
/// The KDF parameters are not recorded on the wire, so decryption must
/// use the same parameters as encryption.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Maximum plaintext bytes per frame.
    pub chunk_size: usize,
    /// Key-derivation parameters.
    pub kdf: KdfParams,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            kdf: KdfParams::default(),
        }
    }
}

impl StreamOptions {
    /// Set the plaintext chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the key-derivation parameters.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }
}

fn encode_header(salt: &Salt, total_size: u64) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(salt.as_bytes());
    header.extend_from_slice(&((total_size >> 32) as u32).to_be_bytes());
    header.extend_from_slice(&(total_size as u32).to_be_bytes());
    header
}

/// Lazy encrypting stream over a byte source.
///
/// The first item is the 24-byte stream header; every subsequent item
/// is one complete frame. Yields `Err` at most once and then fuses.
pub struct EncryptStream<S: Read, R: RandomSource = OsRandom> {
    source: S,
    rng: R,
    key: DerivedKey,
    chunk_size: usize,
    total_size: u64,
    processed: u64,
    header: Option<Vec<u8>>,
    finished: bool,
    progress: Option<ProgressFn>,
}

impl<S: Read> EncryptStream<S> {
    /// Start encrypting `source` under `password`.
    ///
    /// Generates the operation's salt and derives the key once, up
    /// front. `total_size` is recorded in the header and drives
    /// progress reporting; it does not limit how much is read.
    pub fn new(source: S, total_size: u64, password: &str, options: &StreamOptions) -> Result<Self> {
        Self::with_rng(source, total_size, password, options, OsRandom)
    }
}

impl<S: Read, R: RandomSource> EncryptStream<S, R> {
    /// Start encrypting with an explicit randomness source.
    pub fn with_rng(
        source: S,
        total_size: u64,
        password: &str,
        options: &StreamOptions,
        mut rng: R,
    ) -> Result<Self> {
        if options.chunk_size == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".to_string()));
        }

        let salt = Salt::generate(&mut rng)?;
        let key = derive_key(password, &salt, &options.kdf);
        let header = encode_header(&salt, total_size);

        Ok(Self {
            source,
            rng,
            key,
            chunk_size: options.chunk_size,
            total_size,
            processed: 0,
            header: Some(header),
            finished: false,
            progress: None,
        })
    }

    /// Register a progress callback, invoked after every frame with
    /// `processed / total_size * 100`.
    pub fn on_progress(mut self, callback: impl FnMut(f64) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report_progress(&mut self) {
        if let Some(callback) = self.progress.as_mut() {
            if self.total_size > 0 {
                callback(self.processed as f64 / self.total_size as f64 * 100.0);
            }
        }
    }

    /// Read up to one chunk of plaintext and seal it into a frame.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut plaintext = vec![0u8; self.chunk_size];
        let mut filled = 0;
        while filled < self.chunk_size {
            match self.source.read(&mut plaintext[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::SourceRead(e)),
            }
        }
        if filled == 0 {
            return Ok(None);
        }

        // A distinct nonce per chunk under the same key is mandatory.
        let nonce = aead::generate_nonce(&mut self.rng)?;
        let ciphertext = aead::seal(&self.key, &nonce, &plaintext[..filled])?;

        let mut frame = Vec::with_capacity(FRAME_PREFIX_SIZE + ciphertext.len());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&(ciphertext.len() as u32).to_be_bytes());
        frame.extend_from_slice(&ciphertext);

        self.processed += filled as u64;
        self.report_progress();

        Ok(Some(frame))
    }
}

impl<S: Read, R: RandomSource> Iterator for EncryptStream<S, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(header) = self.header.take() {
            return Some(Ok(header));
        }
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazy decrypting stream over an unaligned byte source.
///
/// Construction consumes exactly the 24-byte header and derives the
/// key; each `next()` then reassembles and authenticates one frame,
/// however the underlying reads happen to be sized. Yields `Err` at
/// most once and then fuses.
pub struct DecryptStream<S: Read> {
    source: S,
    key: DerivedKey,
    total_size: u64,
    processed: u64,
    buffer: Vec<u8>,
    scratch: Vec<u8>,
    eof: bool,
    finished: bool,
    progress: Option<ProgressFn>,
}

impl<S: Read> DecryptStream<S> {
    /// Start decrypting `source` under `password`.
    ///
    /// # Errors
    /// [`Error::TruncatedStream`] if the source ends before the full
    /// header arrives.
    pub fn new(mut source: S, password: &str, options: &StreamOptions) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        read_full(&mut source, &mut header)?;

        let mut salt = [0u8; SALT_LENGTH];
        salt.copy_from_slice(&header[..SALT_LENGTH]);
        let high = u32::from_be_bytes(header[SALT_LENGTH..SALT_LENGTH + 4].try_into().unwrap());
        let low = u32::from_be_bytes(header[SALT_LENGTH + 4..].try_into().unwrap());
        let total_size = (u64::from(high) << 32) | u64::from(low);

        let key = derive_key(password, &Salt::from_bytes(salt), &options.kdf);

        Ok(Self {
            source,
            key,
            total_size,
            processed: 0,
            buffer: Vec::new(),
            scratch: vec![0u8; READ_BUFFER_SIZE],
            eof: false,
            finished: false,
            progress: None,
        })
    }

    /// Total plaintext size recorded in the stream header.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Register a progress callback, invoked after every frame with
    /// `processed / total_size * 100`.
    pub fn on_progress(mut self, callback: impl FnMut(f64) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    fn report_progress(&mut self) {
        if let Some(callback) = self.progress.as_mut() {
            if self.total_size > 0 {
                callback(self.processed as f64 / self.total_size as f64 * 100.0);
            }
        }
    }

    /// Length of the next complete frame's ciphertext, if buffered.
    fn buffered_frame_len(&self) -> Option<usize> {
        if self.buffer.len() < FRAME_PREFIX_SIZE {
            return None;
        }
        let len_bytes: [u8; 4] = self.buffer[NONCE_SIZE..FRAME_PREFIX_SIZE].try_into().unwrap();
        let ciphertext_len = u32::from_be_bytes(len_bytes) as usize;
        if self.buffer.len() < FRAME_PREFIX_SIZE + ciphertext_len {
            return None;
        }
        Some(ciphertext_len)
    }

    /// Extract, authenticate, and decrypt frames until one is yielded
    /// or the stream ends.
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(ciphertext_len) = self.buffered_frame_len() {
                let mut nonce = [0u8; NONCE_SIZE];
                nonce.copy_from_slice(&self.buffer[..NONCE_SIZE]);
                let frame_end = FRAME_PREFIX_SIZE + ciphertext_len;

                let plaintext =
                    aead::open(&self.key, &nonce, &self.buffer[FRAME_PREFIX_SIZE..frame_end])?;

                self.buffer.drain(..frame_end);
                self.processed += plaintext.len() as u64;
                self.report_progress();
                return Ok(Some(plaintext));
            }

            if self.eof {
                if !self.buffer.is_empty() {
                    // Partial frame left over at end-of-data.
                    return Err(Error::TruncatedStream);
                }
                if self.processed != self.total_size {
                    // Whole frames are missing from the tail: the
                    // header promised more plaintext than arrived.
                    return Err(Error::TruncatedStream);
                }
                return Ok(None);
            }

            match self.source.read(&mut self.scratch) {
                Ok(0) => self.eof = true,
                Ok(n) => self.buffer.extend_from_slice(&self.scratch[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::SourceRead(e)),
            }
        }
    }
}

impl<S: Read> Iterator for DecryptStream<S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Read exactly `buf.len()` bytes, mapping a premature end-of-data to
/// `TruncatedStream` rather than an I/O error.
fn read_full<S: Read>(source: &mut S, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::TruncatedStream),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::SourceRead(e)),
        }
    }
    Ok(())
}

/// Encrypt a complete in-memory byte slice into one encoded stream.
pub fn encrypt_bytes(data: &[u8], password: &str, options: &StreamOptions) -> Result<Vec<u8>> {
    let stream = EncryptStream::new(data, data.len() as u64, password, options)?;
    let mut output = Vec::new();
    for piece in stream {
        output.extend_from_slice(&piece?);
    }
    Ok(output)
}

/// Decrypt a complete in-memory encoded stream back to plaintext.
pub fn decrypt_bytes(data: &[u8], password: &str, options: &StreamOptions) -> Result<Vec<u8>> {
    let stream = DecryptStream::new(data, password, options)?;
    let mut output = Vec::new();
    for chunk in stream {
        output.extend_from_slice(&chunk?);
    }
    Ok(output)
}
