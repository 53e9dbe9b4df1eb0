//! Error types for primitive operations

use thiserror::Error;

/// Errors from key handling, key agreement and AEAD operations.
///
/// Variants never carry key material. Authentication failures are reported
/// through the single [`CryptoError::DecryptionFailed`] variant so callers
/// cannot distinguish a wrong key from a tampered ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Malformed, wrong-length, wrong-prefix or out-of-range key
    #[error("invalid key: {reason}")]
    InvalidKey {
        /// What was wrong with the key encoding
        reason: String,
    },

    /// Key agreement produced no usable secret
    #[error("shared secret computation failed")]
    SecretComputationFailed,

    /// Peer public key is not a valid curve point
    #[error("invalid recipient public key: not a point on secp256k1")]
    InvalidRecipientPublicKey,

    /// Nonce slice has the wrong width
    #[error("invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Required nonce width
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },

    /// Authentication tag slice has the wrong width
    #[error("invalid auth tag length: expected {expected}, got {actual}")]
    InvalidAuthTagLength {
        /// Required tag width
        expected: usize,
        /// Width that was supplied
        actual: usize,
    },

    /// AEAD authentication failed (wrong key, tampered or truncated data)
    #[error("decryption failed")]
    DecryptionFailed,

    /// AEAD refused to encrypt (input exceeds the cipher's limits)
    #[error("encryption failed")]
    EncryptionFailed,

    /// Entropy source never produced a valid scalar
    #[error("key generation failed after {attempts} attempts")]
    KeyGenerationFailed {
        /// Number of candidates drawn
        attempts: u32,
    },
}

impl CryptoError {
    pub(crate) fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CryptoError::InvalidAuthTagLength { expected: 16, actual: 3 };
        assert_eq!(err.to_string(), "invalid auth tag length: expected 16, got 3");
    }
}
