//! Single-recipient wire format.
//!
//! ```text
//! simple: ephemeral_public_key[65] || nonce[24] || tag[16] || ciphertext[..]
//! single: ephemeral_public_key[65] || nonce[24] || tag[16] || length[4, BE] || ciphertext[length]
//! ```
//!
//! The first 105 bytes are the fixed [`EnvelopeHeader`], parsed without
//! copying. In simple mode the ciphertext runs to the end of the buffer; in
//! single mode the length prefix bounds it, so several messages can be
//! concatenated and walked with [`Decrypted::consumed_bytes`].

use bytes::BufMut;
use lockbox_crypto::{
    CryptoCore, CryptoError, Entropy, NONCE_SIZE, OsEntropy, PrivateKey, PublicKey, TAG_SIZE,
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Width of the single-mode length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Selects between the two single-recipient layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionMode {
    /// No length field; ciphertext is the rest of the buffer
    Simple,
    /// 4-byte big-endian ciphertext length after the tag
    Single,
}

impl EncryptionMode {
    /// Bytes added on top of the plaintext length.
    pub const fn overhead(self) -> usize {
        match self {
            Self::Simple => EnvelopeHeader::SIZE,
            Self::Single => EnvelopeHeader::SIZE + LENGTH_PREFIX_SIZE,
        }
    }
}

/// Fixed 105-byte envelope header.
///
/// # Security
///
/// The layout is all byte arrays, so every 105-byte pattern is a valid
/// value and untrusted input can be cast directly. Casting checks nothing
/// beyond the width: the ephemeral key is validated by
/// [`SingleRecipientCodec::parse_header`] and the tag by the AEAD.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct EnvelopeHeader {
    ephemeral_public_key: [u8; PublicKey::SIZE], // bytes 0-64
    nonce: [u8; NONCE_SIZE],                     // bytes 65-88
    tag: [u8; TAG_SIZE],                         // bytes 89-104
}

impl EnvelopeHeader {
    /// Size of the serialized header (105 bytes)
    pub const SIZE: usize = PublicKey::SIZE + NONCE_SIZE + TAG_SIZE;

    /// Assemble a header from its fields.
    pub fn new(
        ephemeral_public_key: &PublicKey,
        nonce: [u8; NONCE_SIZE],
        tag: [u8; TAG_SIZE],
    ) -> Self {
        Self { ephemeral_public_key: *ephemeral_public_key.as_bytes(), nonce, tag }
    }

    /// Cast the leading bytes of `bytes` to a header (zero-copy).
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` if fewer than [`Self::SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::InvalidEncryptedDataLength {
                expected: Self::SIZE,
                actual: bytes.len(),
            })
    }

    /// Serialized header bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(IntoBytes::as_bytes(self));
        out
    }

    /// Ephemeral public key as stored (not yet validated).
    pub fn ephemeral_public_key_bytes(&self) -> &[u8; PublicKey::SIZE] {
        &self.ephemeral_public_key
    }

    /// AEAD nonce.
    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    /// AEAD tag.
    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }
}

impl std::fmt::Debug for EnvelopeHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeHeader")
            .field("ephemeral_prefix", &format!("{:#04x}", self.ephemeral_public_key[0]))
            .finish_non_exhaustive()
    }
}

impl PartialEq for EnvelopeHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for EnvelopeHeader {}

/// Validated header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    /// Normalized ephemeral public key
    pub ephemeral_public_key: PublicKey,
    /// AEAD nonce
    pub nonce: [u8; NONCE_SIZE],
    /// AEAD tag
    pub tag: [u8; TAG_SIZE],
    /// Bytes occupied by the fixed header
    pub header_size: usize,
}

/// Output of [`SingleRecipientCodec::decrypt_with_header`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    /// Recovered plaintext
    pub plaintext: Vec<u8>,
    /// Bytes of the input that belonged to this message
    pub consumed_bytes: usize,
}

/// Encoder/decoder for messages addressed to exactly one public key.
///
/// Stateless apart from the entropy inside its [`CryptoCore`]; every call is
/// independent.
#[derive(Debug, Clone, Default)]
pub struct SingleRecipientCodec<E: Entropy = OsEntropy> {
    core: CryptoCore<E>,
}

impl<E: Entropy> SingleRecipientCodec<E> {
    /// Codec driving the given core.
    pub fn new(core: CryptoCore<E>) -> Self {
        Self { core }
    }

    /// Primitive layer used by this codec.
    pub fn core(&self) -> &CryptoCore<E> {
        &self.core
    }

    /// Encrypt `plaintext` for `recipient_public_key` (raw or prefixed).
    ///
    /// A fresh ephemeral key pair and nonce are drawn for every call.
    ///
    /// # Errors
    ///
    /// - `Crypto(InvalidKey)` / `Crypto(InvalidRecipientPublicKey)` for a bad
    ///   recipient key
    /// - `DataLengthOutOfRange` if single mode cannot express the length
    pub fn encrypt(
        &self,
        recipient_public_key: &[u8],
        plaintext: &[u8],
        mode: EncryptionMode,
    ) -> Result<Vec<u8>> {
        let recipient = PublicKey::normalize(recipient_public_key)?;

        let length_prefix = match mode {
            EncryptionMode::Simple => None,
            EncryptionMode::Single => Some(u32::try_from(plaintext.len()).map_err(|_| {
                ProtocolError::DataLengthOutOfRange {
                    length: plaintext.len() as u64,
                    max: u64::from(u32::MAX),
                }
            })?),
        };

        let ephemeral = self.core.generate_ephemeral_key_pair()?;
        let ephemeral_public_key = *ephemeral.public_key();
        let key = ephemeral.diffie_hellman(recipient.as_bytes())?.symmetric_key();
        let envelope = self.core.encrypt(&key, plaintext, &[])?;

        let header = EnvelopeHeader::new(&ephemeral_public_key, envelope.nonce, envelope.tag);

        let mut out = Vec::with_capacity(mode.overhead() + envelope.ciphertext.len());
        out.put_slice(&header.to_bytes());
        if let Some(length) = length_prefix {
            out.put_u32(length);
        }
        out.put_slice(&envelope.ciphertext);

        debug_assert_eq!(out.len(), mode.overhead() + plaintext.len());
        tracing::debug!(
            ?mode,
            plaintext_len = plaintext.len(),
            wire_len = out.len(),
            "sealed message"
        );

        Ok(out)
    }

    /// Parse and validate the fixed header at the start of `data`.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` if `data` is shorter than the header
    /// - `InvalidEphemeralPublicKey` if the embedded key has a bad prefix
    pub fn parse_header(data: &[u8]) -> Result<ParsedHeader> {
        let header = EnvelopeHeader::from_bytes(data)?;

        let ephemeral_public_key = PublicKey::normalize(header.ephemeral_public_key_bytes())
            .map_err(|_| {
                tracing::warn!("rejected envelope with malformed ephemeral key");
                ProtocolError::InvalidEphemeralPublicKey
            })?;

        Ok(ParsedHeader {
            ephemeral_public_key,
            nonce: *header.nonce(),
            tag: *header.tag(),
            header_size: EnvelopeHeader::SIZE,
        })
    }

    /// Decrypt the message at the start of `data`.
    ///
    /// In single mode, bytes after the declared ciphertext are left alone and
    /// reported through [`Decrypted::consumed_bytes`].
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` for a truncated header, a missing
    ///   length prefix, or a declared length beyond the buffer
    /// - `InvalidEphemeralPublicKey` if the ephemeral key is malformed or off
    ///   the curve
    /// - `Crypto(DecryptionFailed)` on wrong key or tampered data
    pub fn decrypt_with_header(
        &self,
        private_key: &PrivateKey,
        data: &[u8],
        mode: EncryptionMode,
    ) -> Result<Decrypted> {
        let header = Self::parse_header(data)?;
        let body = &data[header.header_size..];

        let (ciphertext, consumed_bytes) = match mode {
            EncryptionMode::Simple => (body, data.len()),
            EncryptionMode::Single => {
                let Some((prefix, rest)) = body.split_first_chunk::<LENGTH_PREFIX_SIZE>() else {
                    return Err(ProtocolError::InvalidEncryptedDataLength {
                        expected: mode.overhead(),
                        actual: data.len(),
                    });
                };

                let declared = u32::from_be_bytes(*prefix) as usize;
                if declared > rest.len() {
                    tracing::warn!(
                        declared,
                        available = rest.len(),
                        "length prefix exceeds buffer"
                    );
                    return Err(ProtocolError::InvalidEncryptedDataLength {
                        expected: mode.overhead() + declared,
                        actual: data.len(),
                    });
                }

                (&rest[..declared], mode.overhead() + declared)
            },
        };

        let key = self
            .core
            .compute_shared_secret(private_key, header.ephemeral_public_key.as_bytes())
            .map_err(|err| match err {
                CryptoError::InvalidKey { .. } | CryptoError::InvalidRecipientPublicKey => {
                    ProtocolError::InvalidEphemeralPublicKey
                },
                other => ProtocolError::Crypto(other),
            })?
            .symmetric_key();

        let plaintext =
            self.core.aead_decrypt(&key, &header.nonce, &header.tag, ciphertext, &[])?;

        tracing::debug!(?mode, consumed_bytes, "opened message");

        Ok(Decrypted { plaintext, consumed_bytes })
    }

    /// Decrypt a buffer holding exactly one message.
    ///
    /// # Errors
    ///
    /// As [`Self::decrypt_with_header`], plus `InvalidEncryptedDataLength` if
    /// bytes remain after the message.
    pub fn decrypt(
        &self,
        private_key: &PrivateKey,
        data: &[u8],
        mode: EncryptionMode,
    ) -> Result<Vec<u8>> {
        let decrypted = self.decrypt_with_header(private_key, data, mode)?;

        if decrypted.consumed_bytes != data.len() {
            return Err(ProtocolError::InvalidEncryptedDataLength {
                expected: decrypted.consumed_bytes,
                actual: data.len(),
            });
        }

        Ok(decrypted.plaintext)
    }
}
