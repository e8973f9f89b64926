//! Cipherbox CLI - password-based encryption from the command line.
//!
//! Exposes the engine's five operations: text encrypt/decrypt (JSON
//! envelope on stdout), file encrypt/decrypt (streaming), and random
//! password generation. Passwords are prompted without echo and are
//! never logged.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use cipherbox_crypto::{
    decrypt_text, encrypt_text, generate_password, DecryptStream, EncryptStream, PasswordOptions,
    StreamOptions, TextEnvelope,
};

#[derive(Parser)]
#[command(name = "cipherbox")]
#[command(about = "Cipherbox - password-based encryption toolbox")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text and print the JSON envelope.
    EncryptText {
        /// Plaintext to encrypt; read from stdin if omitted.
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Decrypt a JSON envelope and print the plaintext.
    DecryptText {
        /// Envelope JSON; read from stdin if omitted.
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Encrypt a file into the streaming format.
    EncryptFile {
        /// Plaintext input file.
        #[arg(short, long)]
        source: PathBuf,

        /// Encrypted output file.
        #[arg(short, long)]
        dest: PathBuf,

        /// Plaintext chunk size in bytes.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Decrypt a file from the streaming format.
    DecryptFile {
        /// Encrypted input file.
        #[arg(short, long)]
        source: PathBuf,

        /// Plaintext output file.
        #[arg(short, long)]
        dest: PathBuf,
    },

    /// Generate a random password.
    GeneratePassword {
        /// Password length in characters.
        #[arg(short, long, default_value_t = 16)]
        length: usize,

        /// Exclude uppercase letters.
        #[arg(long)]
        no_uppercase: bool,

        /// Exclude lowercase letters.
        #[arg(long)]
        no_lowercase: bool,

        /// Exclude digits.
        #[arg(long)]
        no_digits: bool,

        /// Exclude symbols.
        #[arg(long)]
        no_symbols: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::EncryptText { input } => {
            let plaintext = read_input(input)?;
            let password = prompt_new_password()?;
            let envelope = encrypt_text(&plaintext, &password)?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }

        Commands::DecryptText { input } => {
            let json = read_input(input)?;
            let envelope: TextEnvelope =
                serde_json::from_str(json.trim()).context("invalid envelope JSON")?;
            let password = rpassword::prompt_password("Password: ")?;
            let plaintext = decrypt_text(&envelope, &password)?;
            println!("{}", plaintext);
        }

        Commands::EncryptFile {
            source,
            dest,
            chunk_size,
        } => {
            let password = prompt_new_password()?;
            let mut options = StreamOptions::default();
            if let Some(size) = chunk_size {
                options = options.with_chunk_size(size);
            }
            let written = encrypt_file(&source, &dest, &password, &options)?;
            info!(
                "encrypted {} -> {} ({} bytes written)",
                source.display(),
                dest.display(),
                written
            );
        }

        Commands::DecryptFile { source, dest } => {
            let password = rpassword::prompt_password("Password: ")?;
            let written = decrypt_file(&source, &dest, &password, &StreamOptions::default())?;
            info!(
                "decrypted {} -> {} ({} bytes written)",
                source.display(),
                dest.display(),
                written
            );
        }

        Commands::GeneratePassword {
            length,
            no_uppercase,
            no_lowercase,
            no_digits,
            no_symbols,
        } => {
            let options = PasswordOptions {
                uppercase: !no_uppercase,
                lowercase: !no_lowercase,
                digits: !no_digits,
                symbols: !no_symbols,
            };
            println!("{}", generate_password(length, &options)?);
        }
    }

    Ok(())
}

/// Use the flag value if given, otherwise read all of stdin.
fn read_input(input: Option<String>) -> Result<String> {
    match input {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

/// Prompt for a new password twice and require both entries to match.
fn prompt_new_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        bail!("passwords do not match");
    }
    Ok(password)
}

/// Stream-encrypt `source` into `dest`, returning bytes written.
fn encrypt_file(
    source: &Path,
    dest: &Path,
    password: &str,
    options: &StreamOptions,
) -> Result<u64> {
    let file = File::open(source)
        .with_context(|| format!("failed to open {}", source.display()))?;
    let total_size = file.metadata()?.len();
    let reader = BufReader::new(file);
    let mut writer = BufWriter::new(
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?,
    );

    let stream = EncryptStream::new(reader, total_size, password, options)?
        .on_progress(|percent| debug!("encrypting: {:.1}%", percent));

    let mut written = 0u64;
    for piece in stream {
        let piece = piece?;
        writer.write_all(&piece)?;
        written += piece.len() as u64;
    }
    writer.flush()?;
    Ok(written)
}

/// Stream-decrypt `source` into `dest`, returning bytes written.
fn decrypt_file(
    source: &Path,
    dest: &Path,
    password: &str,
    options: &StreamOptions,
) -> Result<u64> {
    let file = File::open(source)
        .with_context(|| format!("failed to open {}", source.display()))?;
    let reader = BufReader::new(file);
    let mut writer = BufWriter::new(
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?,
    );

    let stream = DecryptStream::new(reader, password, options)?
        .on_progress(|percent| debug!("decrypting: {:.1}%", percent));

    let mut written = 0u64;
    for chunk in stream {
        let chunk = chunk?;
        writer.write_all(&chunk)?;
        written += chunk.len() as u64;
    }
    writer.flush()?;
    Ok(written)
}
