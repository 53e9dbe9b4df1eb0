//! Lockbox command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Create alice.key / alice.pub
//! lockbox keygen --out alice
//!
//! # Encrypt for one or more recipients (file path or inline hex)
//! lockbox encrypt --to alice.pub --to bob.pub --input notes.txt --output notes.lbx
//!
//! # Large files as a stream of fixed-size blocks
//! lockbox encrypt-stream --to alice.pub --input big.iso --output big.lbs
//! lockbox decrypt-stream --key alice.key --input big.lbs --output big.iso
//!
//! # Decrypt, sign, verify
//! lockbox decrypt --key alice.key --input notes.lbx --output notes.txt
//! lockbox sign --key alice.key --input notes.txt --output notes.sig
//! lockbox verify --public-key alice.pub --input notes.txt --signature notes.sig
//! ```

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};
use lockbox_cli::{CliError, keyfile};
use lockbox_crypto::CryptoCore;
use lockbox_proto::{DEFAULT_BLOCK_SIZE, EncryptionMode, Limits, Lockbox};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Hybrid public-key encryption over secp256k1
#[derive(Parser, Debug)]
#[command(name = "lockbox")]
#[command(about = "Encrypt, decrypt, sign and verify with secp256k1 keys")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Maximum recipients accepted in a multi-recipient message
    #[arg(long, default_value_t = Limits::MAX_RECIPIENTS, global = true)]
    max_recipients: u16,

    /// Maximum plaintext size in bytes for multi-recipient messages
    #[arg(long, default_value_t = Limits::MAX_DATA_SIZE, global = true)]
    max_data_size: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair as <OUT>.key and <OUT>.pub
    Keygen {
        /// Output path stem
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Encrypt a file for one or more recipients
    Encrypt {
        /// Recipient public key (.pub file or hex), repeatable
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,

        /// Single-recipient framing
        #[arg(short, long, value_enum, default_value = "single")]
        mode: Mode,

        /// Plaintext file
        #[arg(short, long)]
        input: PathBuf,

        /// Encrypted output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decrypt a file with a private key
    Decrypt {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Encrypted file
        #[arg(short, long)]
        input: PathBuf,

        /// Plaintext output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Encrypt a large file for one recipient in fixed-size blocks
    EncryptStream {
        /// Recipient public key (.pub file or hex)
        #[arg(short, long = "to")]
        to: String,

        /// Encrypted block size in bytes
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Plaintext file
        #[arg(short, long)]
        input: PathBuf,

        /// Encrypted output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decrypt a file written by encrypt-stream
    DecryptStream {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Encrypted block size in bytes
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,

        /// Encrypted file
        #[arg(short, long)]
        input: PathBuf,

        /// Plaintext output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Sign a file
    Sign {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// File to sign
        #[arg(short, long)]
        input: PathBuf,

        /// Signature output file (hex); stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a file signature
    Verify {
        /// Signer public key (.pub file or hex)
        #[arg(short, long)]
        public_key: String,

        /// Signed file
        #[arg(short, long)]
        input: PathBuf,

        /// Signature file (hex)
        #[arg(short, long)]
        signature: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// No length field
    Simple,
    /// 4-byte length prefix
    Single,
}

impl From<Mode> for EncryptionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Simple => Self::Simple,
            Mode::Single => Self::Single,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let limits = Limits {
        max_recipients: args.max_recipients,
        max_data_size: args.max_data_size,
    };
    let lockbox = Lockbox::new(CryptoCore::system(), limits);
    tracing::debug!(?limits, "configured");

    match args.command {
        Command::Keygen { out } => {
            let key_pair = lockbox_cli::keygen(&lockbox)?;
            let (private_path, public_path) = keyfile::write_key_pair(&out, &key_pair)?;
            tracing::info!(
                private = %private_path.display(),
                public = %public_path.display(),
                "wrote key files"
            );
            write_stdout(&key_pair.public_key().to_string())?;
        },
        Command::Encrypt { to, mode, input, output } => {
            let recipients = to
                .iter()
                .map(String::as_str)
                .map(keyfile::read_public_key)
                .collect::<Result<Vec<_>, _>>()?;
            let plaintext = read(&input)?;
            let sealed = lockbox_cli::encrypt(&lockbox, &recipients, mode.into(), &plaintext)?;
            write(&output, &sealed)?;
        },
        Command::Decrypt { key, input, output } => {
            let private_key = keyfile::read_private_key(&key)?;
            let sealed = read(&input)?;
            let plaintext = lockbox_cli::decrypt(&lockbox, &private_key, &sealed)?;
            write(&output, &plaintext)?;
        },
        Command::EncryptStream { to, block_size, input, output } => {
            let recipient = keyfile::read_public_key(&to)?;
            let plaintext = read(&input)?;
            let sealed =
                lockbox_cli::encrypt_stream(&lockbox, &recipient, &plaintext, block_size)?;
            write(&output, &sealed)?;
        },
        Command::DecryptStream { key, block_size, input, output } => {
            let private_key = keyfile::read_private_key(&key)?;
            let sealed = read(&input)?;
            let plaintext =
                lockbox_cli::decrypt_stream(&lockbox, &private_key, &sealed, block_size)?;
            write(&output, &plaintext)?;
        },
        Command::Sign { key, input, output } => {
            let private_key = keyfile::read_private_key(&key)?;
            let message = read(&input)?;
            let signature = lockbox_cli::sign(&lockbox, &private_key, &message);
            match output {
                Some(path) => write(&path, signature.as_bytes())?,
                None => write_stdout(&signature)?,
            }
        },
        Command::Verify { public_key, input, signature } => {
            let public_key = keyfile::read_public_key(&public_key)?;
            let message = read(&input)?;
            let signature = fs::read_to_string(&signature).map_err(CliError::io(&signature))?;
            lockbox_cli::verify(&lockbox, &public_key, &message, &signature)?;
            write_stdout("OK")?;
        },
    }

    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(CliError::io(path))
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    fs::write(path, bytes).map_err(CliError::io(path))
}

fn write_stdout(line: &str) -> Result<(), CliError> {
    writeln!(std::io::stdout().lock(), "{line}").map_err(CliError::io("<stdout>"))
}
