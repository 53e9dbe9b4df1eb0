//! Recipient identifiers.

use std::fmt;

use lockbox_crypto::PublicKey;
use sha2::{Digest, Sha256};

use crate::errors::{ProtocolError, Result};

/// Opaque 16-byte recipient identifier carried in multi-recipient headers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipientId([u8; RecipientId::SIZE]);

impl RecipientId {
    /// Encoded width (16 bytes)
    pub const SIZE: usize = 16;

    /// Wrap 16 bytes. `None` for any other width.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; Self::SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// Identifier derived from a public key: leading 16 bytes of
    /// SHA-256 over the prefixed encoding.
    pub fn derive(public_key: &PublicKey) -> Self {
        let digest = Sha256::digest(public_key.as_bytes());
        let mut id = [0u8; Self::SIZE];
        id.copy_from_slice(&digest[..Self::SIZE]);
        Self(id)
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }
}

impl From<[u8; RecipientId::SIZE]> for RecipientId {
    fn from(bytes: [u8; RecipientId::SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecipientId({self})")
    }
}

/// One addressee of a multi-recipient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Identifier written into the header
    pub id: RecipientId,
    /// Normalized public key the content key is wrapped for
    pub public_key: PublicKey,
}

impl Recipient {
    /// Build a recipient from an identifier and an encoded public key.
    ///
    /// # Errors
    ///
    /// - `Crypto(InvalidKey)` if the key fails normalization
    pub fn new(id: RecipientId, public_key: &[u8]) -> Result<Self> {
        Ok(Self { id, public_key: PublicKey::normalize(public_key)? })
    }

    /// Recipient whose identifier is [`RecipientId::derive`]d from its key.
    pub fn from_public_key(public_key: PublicKey) -> Self {
        Self { id: RecipientId::derive(&public_key), public_key }
    }

    /// Pair up parallel identifier and key lists.
    ///
    /// # Errors
    ///
    /// - `RecipientKeyCountMismatch` if the lists differ in length
    /// - `Crypto(InvalidKey)` if any key fails normalization
    pub fn zip<K: AsRef<[u8]>>(ids: &[RecipientId], keys: &[K]) -> Result<Vec<Self>> {
        if ids.len() != keys.len() {
            return Err(ProtocolError::RecipientKeyCountMismatch {
                ids: ids.len(),
                keys: keys.len(),
            });
        }

        ids.iter().zip(keys).map(|(id, key)| Self::new(*id, key.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use lockbox_crypto::{KeyPair, SeededEntropy};

    use super::*;

    #[test]
    fn derive_is_stable_per_key() {
        let key_pair = KeyPair::generate(&SeededEntropy::from_seed(1)).unwrap();
        let other = KeyPair::generate(&SeededEntropy::from_seed(2)).unwrap();

        let id = RecipientId::derive(key_pair.public_key());
        assert_eq!(id, RecipientId::derive(key_pair.public_key()));
        assert_ne!(id, RecipientId::derive(other.public_key()));
    }

    #[test]
    fn from_slice_checks_width() {
        assert!(RecipientId::from_slice(&[0u8; 15]).is_none());
        assert!(RecipientId::from_slice(&[0u8; 16]).is_some());
        assert!(RecipientId::from_slice(&[0u8; 17]).is_none());
    }

    #[test]
    fn zip_rejects_length_mismatch() {
        let key_pair = KeyPair::generate(&SeededEntropy::from_seed(3)).unwrap();
        let ids = [RecipientId::from([1; 16]), RecipientId::from([2; 16])];
        let keys = [key_pair.public_key().as_bytes().to_vec()];

        let result = Recipient::zip(&ids, &keys);
        assert_eq!(result, Err(ProtocolError::RecipientKeyCountMismatch { ids: 2, keys: 1 }));
    }

    #[test]
    fn zip_normalizes_raw_keys() {
        let key_pair = KeyPair::generate(&SeededEntropy::from_seed(4)).unwrap();
        let ids = [RecipientId::from([7; 16])];
        let keys = [key_pair.public_key().raw()];

        let recipients = Recipient::zip(&ids, &keys).unwrap();
        assert_eq!(recipients[0].public_key, *key_pair.public_key());
    }

    #[test]
    fn display_is_hex() {
        let id = RecipientId::from([0xAB; 16]);
        assert_eq!(id.to_string(), "ab".repeat(16));
    }
}
