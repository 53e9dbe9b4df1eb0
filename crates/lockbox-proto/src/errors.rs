//! Protocol error types

use lockbox_crypto::CryptoError;
use thiserror::Error;

use crate::recipient::RecipientId;

/// Result alias for wire format operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors from building or parsing Lockbox messages.
///
/// Every failure from the primitive layer is wrapped in
/// [`ProtocolError::Crypto`], so nothing below the codecs escapes untyped.
/// Variants carry lengths and counts for diagnostics, never key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Primitive failure (bad key, failed agreement, AEAD rejection)
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Encrypted buffer is shorter (or longer) than its framing requires
    #[error("invalid encrypted data length: expected {expected}, got {actual}")]
    InvalidEncryptedDataLength {
        /// Length the framing requires
        expected: usize,
        /// Length of the buffer
        actual: usize,
    },

    /// Embedded ephemeral public key is malformed or not on the curve
    #[error("invalid ephemeral public key")]
    InvalidEphemeralPublicKey,

    /// Declared data length disagrees with the buffer or the plaintext
    #[error("invalid data length: expected {expected}, got {actual}")]
    InvalidDataLength {
        /// Length implied by the header
        expected: u64,
        /// Length actually present
        actual: u64,
    },

    /// Data length is zero or above the configured maximum
    #[error("data length {length} out of range (1..={max})")]
    DataLengthOutOfRange {
        /// Offending length
        length: u64,
        /// Configured maximum
        max: u64,
    },

    /// More recipients than the header can address
    #[error("too many recipients: {count} exceeds {max}")]
    TooManyRecipients {
        /// Requested recipient count
        count: usize,
        /// Configured maximum
        max: u16,
    },

    /// Recipient count is zero or above the configured maximum
    #[error("invalid recipient count {count} (1..={max})")]
    InvalidRecipientCount {
        /// Count found or requested
        count: usize,
        /// Configured maximum
        max: u16,
    },

    /// Recipient identifier is not listed in the message header
    #[error("recipient not found")]
    RecipientNotFound,

    /// Same identifier listed twice in one header
    #[error("duplicate recipient id {id}")]
    DuplicateRecipientId {
        /// Repeated identifier
        id: RecipientId,
    },

    /// Identifier and key lists have different lengths
    #[error("recipient key count mismatch: {ids} ids, {keys} keys")]
    RecipientKeyCountMismatch {
        /// Number of recipient identifiers
        ids: usize,
        /// Number of keys
        keys: usize,
    },

    /// Leading type byte is not a known encryption type
    #[error("invalid encryption type: {0:#04x}")]
    InvalidEncryptionType(u8),

    /// Block cannot hold the per-block overhead plus at least one byte
    #[error("block size {block_size} must exceed overhead {overhead}")]
    InvalidBlockSize {
        /// Requested block size
        block_size: usize,
        /// Per-block overhead
        overhead: usize,
    },
}

impl ProtocolError {
    /// Returns true if the error reports a length or framing inconsistency.
    ///
    /// Truncated or over-long input always lands here, never in an
    /// out-of-bounds read.
    pub fn is_length_error(&self) -> bool {
        match self {
            Self::InvalidEncryptedDataLength { .. }
            | Self::InvalidDataLength { .. }
            | Self::DataLengthOutOfRange { .. }
            | Self::Crypto(
                CryptoError::InvalidNonceLength { .. } | CryptoError::InvalidAuthTagLength { .. },
            ) => true,

            Self::Crypto(_)
            | Self::InvalidEphemeralPublicKey
            | Self::TooManyRecipients { .. }
            | Self::InvalidRecipientCount { .. }
            | Self::RecipientNotFound
            | Self::DuplicateRecipientId { .. }
            | Self::RecipientKeyCountMismatch { .. }
            | Self::InvalidEncryptionType(_)
            | Self::InvalidBlockSize { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_length_error() {
        let err = ProtocolError::InvalidEncryptedDataLength { expected: 105, actual: 10 };
        assert!(err.is_length_error());
    }

    #[test]
    fn decryption_failure_is_not_length_error() {
        let err = ProtocolError::from(CryptoError::DecryptionFailed);
        assert!(!err.is_length_error());
    }

    #[test]
    fn crypto_errors_display_transparently() {
        let err = ProtocolError::from(CryptoError::DecryptionFailed);
        assert_eq!(err.to_string(), "decryption failed");
    }

    #[test]
    fn error_display() {
        let err = ProtocolError::RecipientKeyCountMismatch { ids: 3, keys: 2 };
        assert_eq!(err.to_string(), "recipient key count mismatch: 3 ids, 2 keys");

        let err = ProtocolError::DuplicateRecipientId { id: RecipientId::from([0xAB; 16]) };
        assert_eq!(err.to_string(), format!("duplicate recipient id {}", "ab".repeat(16)));
    }
}
