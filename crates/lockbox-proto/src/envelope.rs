//! Self-describing envelopes: one type byte in front of an encoded message.

use crate::{
    errors::{ProtocolError, Result},
    single::EncryptionMode,
};

/// Leading byte identifying how the rest of a typed envelope is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncryptionType {
    /// Single-recipient message, simple mode
    Simple = 33,
    /// Single-recipient message, single mode
    Single = 66,
    /// Multi-recipient message
    Multiple = 99,
}

impl EncryptionType {
    /// Width of the type prefix
    pub const SIZE: usize = 1;

    /// Decode a type byte. `None` if unrecognized.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            33 => Some(Self::Simple),
            66 => Some(Self::Single),
            99 => Some(Self::Multiple),
            _ => None,
        }
    }

    /// Encoded type byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Single-recipient mode, or `None` for [`Self::Multiple`].
    #[must_use]
    pub const fn mode(self) -> Option<EncryptionMode> {
        match self {
            Self::Simple => Some(EncryptionMode::Simple),
            Self::Single => Some(EncryptionMode::Single),
            Self::Multiple => None,
        }
    }

    /// Split the type byte off an envelope.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` for an empty buffer
    /// - `InvalidEncryptionType` for an unknown type byte
    pub fn split(data: &[u8]) -> Result<(Self, &[u8])> {
        let (&byte, rest) = data.split_first().ok_or(ProtocolError::InvalidEncryptedDataLength {
            expected: Self::SIZE,
            actual: 0,
        })?;

        let kind = Self::from_byte(byte).ok_or_else(|| {
            tracing::warn!(byte, "unknown encryption type");
            ProtocolError::InvalidEncryptionType(byte)
        })?;

        Ok((kind, rest))
    }

    /// Prefix `payload` with this type byte.
    #[must_use]
    pub fn prepend(self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::SIZE + payload.len());
        out.push(self.to_byte());
        out.extend_from_slice(payload);
        out
    }
}

impl From<EncryptionMode> for EncryptionType {
    fn from(mode: EncryptionMode) -> Self {
        match mode {
            EncryptionMode::Simple => Self::Simple,
            EncryptionMode::Single => Self::Single,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_values() {
        assert_eq!(EncryptionType::Simple.to_byte(), 33);
        assert_eq!(EncryptionType::Single.to_byte(), 66);
        assert_eq!(EncryptionType::Multiple.to_byte(), 99);
    }

    #[test]
    fn from_byte_inverts_to_byte() {
        for kind in [EncryptionType::Simple, EncryptionType::Single, EncryptionType::Multiple] {
            assert_eq!(EncryptionType::from_byte(kind.to_byte()), Some(kind));
        }
        assert_eq!(EncryptionType::from_byte(0), None);
    }

    #[test]
    fn split_rejects_empty_and_unknown() {
        assert_eq!(
            EncryptionType::split(&[]),
            Err(ProtocolError::InvalidEncryptedDataLength { expected: 1, actual: 0 })
        );
        assert_eq!(EncryptionType::split(&[7, 1, 2]), Err(ProtocolError::InvalidEncryptionType(7)));
    }

    #[test]
    fn prepend_then_split() {
        let typed = EncryptionType::Single.prepend(b"body");
        assert_eq!(EncryptionType::split(&typed), Ok((EncryptionType::Single, &b"body"[..])));
    }
}
