//! CLI error type

use std::path::PathBuf;

use lockbox_crypto::CryptoError;
use lockbox_proto::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the `lockbox` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading or writing a file failed
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Key or signature text is not valid hex
    #[error("{what} is not valid hex: {source}")]
    Hex {
        /// What was being decoded
        what: &'static str,
        /// Decoder error
        #[source]
        source: hex::FromHexError,
    },

    /// Engine rejected the operation
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Key material is invalid
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Signature did not verify
    #[error("signature verification failed")]
    VerificationFailed,
}

impl CliError {
    /// Adapter for `map_err` that tags an I/O error with its path.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Result alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
