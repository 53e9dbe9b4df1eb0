//! Multi-recipient wire format.
//!
//! One random content key encrypts the body once; the key is then wrapped for
//! every recipient as a simple-mode single-recipient envelope.
//!
//! ```text
//! header: data_length[8, BE] || recipient_count[2, BE]
//!         || recipient_id[16] * n || wrapped_key[137] * n
//! body:   nonce[24] || tag[16] || ciphertext[data_length]
//! ```
//!
//! The body AEAD binds the 10-byte prefix and the recipient id list as
//! associated data. Wrapped keys are authenticated by their own envelopes.

use std::collections::HashSet;

use bytes::{BufMut, Bytes};
use lockbox_crypto::{
    Entropy, NONCE_SIZE, OsEntropy, PrivateKey, SYMMETRIC_KEY_SIZE, SymmetricKey, TAG_SIZE,
};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroizing;

use crate::{
    config::Limits,
    errors::{ProtocolError, Result},
    recipient::{Recipient, RecipientId},
    single::{EncryptionMode, SingleRecipientCodec},
};

/// Width of one wrapped content key (simple envelope of a 32-byte key)
pub const WRAPPED_KEY_SIZE: usize = EncryptionMode::Simple.overhead() + SYMMETRIC_KEY_SIZE;

/// Header bytes contributed by each recipient
pub const PER_RECIPIENT_SIZE: usize = RecipientId::SIZE + WRAPPED_KEY_SIZE;

/// Body bytes on top of the ciphertext
pub const BODY_OVERHEAD: usize = NONCE_SIZE + TAG_SIZE;

/// Rejects a list that names the same recipient twice.
fn check_unique_ids(ids: &[RecipientId]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    match ids.iter().find(|id| !seen.insert(**id)) {
        Some(id) => Err(ProtocolError::DuplicateRecipientId { id: *id }),
        None => Ok(()),
    }
}

/// Fixed 10-byte header prefix.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
struct HeaderPrefix {
    data_length: [u8; 8],     // u64 plaintext length
    recipient_count: [u8; 2], // u16 number of recipients
}

impl HeaderPrefix {
    const SIZE: usize = 10;

    fn new(data_length: u64, recipient_count: u16) -> Self {
        Self {
            data_length: data_length.to_be_bytes(),
            recipient_count: recipient_count.to_be_bytes(),
        }
    }

    fn data_length(&self) -> u64 {
        u64::from_be_bytes(self.data_length)
    }

    fn recipient_count(&self) -> u16 {
        u16::from_be_bytes(self.recipient_count)
    }
}

/// Decoded multi-recipient header.
///
/// # Invariants
///
/// - `recipient_ids.len() == wrapped_keys.len()`, and the count fits in the
///   2-byte field
/// - No recipient id appears twice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiRecipientHeader {
    data_length: u64,
    recipient_ids: Vec<RecipientId>,
    wrapped_keys: Vec<[u8; WRAPPED_KEY_SIZE]>,
}

impl MultiRecipientHeader {
    /// Assemble a header from parallel id and wrapped-key lists.
    ///
    /// # Errors
    ///
    /// - `RecipientKeyCountMismatch` if the lists differ in length
    /// - `TooManyRecipients` if the count does not fit in 2 bytes
    /// - `DuplicateRecipientId` if an id is listed twice
    pub fn new(
        data_length: u64,
        recipient_ids: Vec<RecipientId>,
        wrapped_keys: Vec<[u8; WRAPPED_KEY_SIZE]>,
    ) -> Result<Self> {
        if recipient_ids.len() != wrapped_keys.len() {
            return Err(ProtocolError::RecipientKeyCountMismatch {
                ids: recipient_ids.len(),
                keys: wrapped_keys.len(),
            });
        }

        if u16::try_from(recipient_ids.len()).is_err() {
            return Err(ProtocolError::TooManyRecipients {
                count: recipient_ids.len(),
                max: u16::MAX,
            });
        }

        check_unique_ids(&recipient_ids)?;

        Ok(Self { data_length, recipient_ids, wrapped_keys })
    }

    /// Encoded size of a header addressing `recipient_count` recipients.
    pub const fn size_for(recipient_count: usize) -> usize {
        HeaderPrefix::SIZE + recipient_count * PER_RECIPIENT_SIZE
    }

    /// Encoded size of this header.
    pub fn size(&self) -> usize {
        Self::size_for(self.recipient_ids.len())
    }

    /// Plaintext length the body decrypts to.
    pub fn data_length(&self) -> u64 {
        self.data_length
    }

    /// Recipient identifiers in header order.
    pub fn recipient_ids(&self) -> &[RecipientId] {
        &self.recipient_ids
    }

    /// Wrapped content keys, parallel to [`Self::recipient_ids`].
    pub fn wrapped_keys(&self) -> &[[u8; WRAPPED_KEY_SIZE]] {
        &self.wrapped_keys
    }

    /// Wrapped key addressed to `id`, if listed.
    pub fn wrapped_key_for(&self, id: &RecipientId) -> Option<&[u8; WRAPPED_KEY_SIZE]> {
        self.recipient_ids
            .iter()
            .position(|candidate| candidate == id)
            .map(|index| &self.wrapped_keys[index])
    }

    fn prefix(&self) -> HeaderPrefix {
        // count bounded by `new`
        HeaderPrefix::new(self.data_length, self.recipient_ids.len() as u16)
    }

    /// Bytes bound into the body AEAD: prefix followed by the id list.
    pub fn associated_data(&self) -> Vec<u8> {
        let ids_len = self.recipient_ids.len() * RecipientId::SIZE;
        let mut aad = Vec::with_capacity(HeaderPrefix::SIZE + ids_len);
        aad.put_slice(self.prefix().as_bytes());
        for id in &self.recipient_ids {
            aad.put_slice(id.as_bytes());
        }
        aad
    }

    /// Append the encoded header to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(self.prefix().as_bytes());
        for id in &self.recipient_ids {
            dst.put_slice(id.as_bytes());
        }
        for key in &self.wrapped_keys {
            dst.put_slice(key);
        }
    }

    /// Decode a header from the start of `data`, enforcing `limits`.
    ///
    /// Returns the header and the number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` if `data` is shorter than the prefix or
    ///   than the size implied by the recipient count
    /// - `InvalidRecipientCount` if the count is zero or above the limit
    /// - `DataLengthOutOfRange` if the data length is zero or above the limit
    /// - `DuplicateRecipientId` if an id is listed twice
    pub fn decode(data: &[u8], limits: &Limits) -> Result<(Self, usize)> {
        let (prefix, _) = HeaderPrefix::ref_from_prefix(data).map_err(|_| {
            ProtocolError::InvalidEncryptedDataLength {
                expected: HeaderPrefix::SIZE,
                actual: data.len(),
            }
        })?;

        let count = prefix.recipient_count();
        if count == 0 || count > limits.max_recipients {
            tracing::warn!(count, max = limits.max_recipients, "rejected recipient count");
            return Err(ProtocolError::InvalidRecipientCount {
                count: usize::from(count),
                max: limits.max_recipients,
            });
        }

        let data_length = prefix.data_length();
        if data_length == 0 || data_length > limits.max_data_size {
            tracing::warn!(data_length, max = limits.max_data_size, "rejected data length");
            return Err(ProtocolError::DataLengthOutOfRange {
                length: data_length,
                max: limits.max_data_size,
            });
        }

        let count = usize::from(count);
        let size = Self::size_for(count);
        if data.len() < size {
            return Err(ProtocolError::InvalidEncryptedDataLength {
                expected: size,
                actual: data.len(),
            });
        }

        let (ids, keys) = data[HeaderPrefix::SIZE..size].split_at(count * RecipientId::SIZE);

        let recipient_ids: Vec<RecipientId> =
            ids.chunks_exact(RecipientId::SIZE).filter_map(RecipientId::from_slice).collect();
        if let Err(err) = check_unique_ids(&recipient_ids) {
            tracing::warn!(count, "rejected duplicate recipient id");
            return Err(err);
        }

        let wrapped_keys = keys
            .chunks_exact(WRAPPED_KEY_SIZE)
            .filter_map(|chunk| <[u8; WRAPPED_KEY_SIZE]>::try_from(chunk).ok())
            .collect();

        Ok((Self { data_length, recipient_ids, wrapped_keys }, size))
    }
}

/// Complete multi-recipient message: header plus shared encrypted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiRecipientMessage {
    header: MultiRecipientHeader,
    body: Bytes,
}

impl MultiRecipientMessage {
    /// Pair a header with its body (`nonce || tag || ciphertext`).
    pub fn new(header: MultiRecipientHeader, body: impl Into<Bytes>) -> Self {
        Self { header, body: body.into() }
    }

    /// Message header.
    pub fn header(&self) -> &MultiRecipientHeader {
        &self.header
    }

    /// Encrypted body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Total encoded size.
    pub fn encoded_len(&self) -> usize {
        self.header.size() + self.body.len()
    }

    /// Append the encoded message to `dst`.
    pub fn encode(&self, dst: &mut impl BufMut) {
        self.header.encode(dst);
        dst.put_slice(&self.body);
    }

    /// Encoded message bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }

    /// Parse a message, taking everything after the header as its body.
    ///
    /// # Errors
    ///
    /// - Any error from [`MultiRecipientHeader::decode`]
    /// - `InvalidEncryptedDataLength` if the body is shorter than nonce + tag
    /// - `InvalidDataLength` if the ciphertext length disagrees with the
    ///   header's data length
    pub fn from_bytes(data: &[u8], limits: &Limits) -> Result<Self> {
        let (header, header_size) = MultiRecipientHeader::decode(data, limits)?;
        let body = &data[header_size..];

        if body.len() < BODY_OVERHEAD {
            return Err(ProtocolError::InvalidEncryptedDataLength {
                expected: header_size + BODY_OVERHEAD,
                actual: data.len(),
            });
        }

        let ciphertext_len = (body.len() - BODY_OVERHEAD) as u64;
        if ciphertext_len != header.data_length {
            return Err(ProtocolError::InvalidDataLength {
                expected: header.data_length,
                actual: ciphertext_len,
            });
        }

        Ok(Self { header, body: Bytes::copy_from_slice(body) })
    }
}

/// Encoder/decoder for messages addressed to many public keys.
#[derive(Debug, Clone, Default)]
pub struct MultiRecipientCodec<E: Entropy = OsEntropy> {
    single: SingleRecipientCodec<E>,
    limits: Limits,
}

impl<E: Entropy> MultiRecipientCodec<E> {
    /// Codec wrapping content keys with `single` and enforcing `limits`.
    pub fn new(single: SingleRecipientCodec<E>, limits: Limits) -> Self {
        Self { single, limits }
    }

    /// Configured limits.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Encrypt `plaintext` once for every recipient.
    ///
    /// # Errors
    ///
    /// - `InvalidRecipientCount` for an empty recipient list
    /// - `TooManyRecipients` above [`Limits::max_recipients`]
    /// - `DataLengthOutOfRange` for an empty or oversized plaintext
    /// - `DuplicateRecipientId` if two recipients share an id
    /// - `Crypto(..)` if wrapping for a recipient key fails
    pub fn encrypt_multiple(
        &self,
        recipients: &[Recipient],
        plaintext: &[u8],
    ) -> Result<MultiRecipientMessage> {
        self.check_recipient_count(recipients.len())?;

        let data_length = plaintext.len() as u64;
        if data_length == 0 || data_length > self.limits.max_data_size {
            return Err(ProtocolError::DataLengthOutOfRange {
                length: data_length,
                max: self.limits.max_data_size,
            });
        }

        let recipient_ids: Vec<RecipientId> =
            recipients.iter().map(|recipient| recipient.id).collect();
        check_unique_ids(&recipient_ids)?;

        let core = self.single.core();
        let content_key = core.random_symmetric_key();

        let wrapped_keys = recipients
            .iter()
            .map(|recipient| self.wrap_key(&content_key, recipient))
            .collect::<Result<Vec<_>>>()?;

        let header = MultiRecipientHeader::new(data_length, recipient_ids, wrapped_keys)?;
        let envelope = core.encrypt(&content_key, plaintext, &header.associated_data())?;

        let mut body = Vec::with_capacity(BODY_OVERHEAD + envelope.ciphertext.len());
        body.put_slice(&envelope.nonce);
        body.put_slice(&envelope.tag);
        body.put_slice(&envelope.ciphertext);

        tracing::debug!(
            recipients = recipients.len(),
            data_length,
            header_len = header.size(),
            "sealed multi-recipient message"
        );

        Ok(MultiRecipientMessage::new(header, body))
    }

    /// Encode `header` after checking it against the configured limits.
    ///
    /// # Errors
    ///
    /// - `InvalidRecipientCount` / `TooManyRecipients` for a bad count
    /// - `DataLengthOutOfRange` for a zero or oversized data length
    pub fn build_header(&self, header: &MultiRecipientHeader) -> Result<Vec<u8>> {
        self.check_recipient_count(header.recipient_ids.len())?;
        if header.data_length == 0 || header.data_length > self.limits.max_data_size {
            return Err(ProtocolError::DataLengthOutOfRange {
                length: header.data_length,
                max: self.limits.max_data_size,
            });
        }

        let mut out = Vec::with_capacity(header.size());
        header.encode(&mut out);
        Ok(out)
    }

    /// Inverse of [`Self::build_header`]; see [`MultiRecipientHeader::decode`].
    pub fn parse_header(&self, data: &[u8]) -> Result<(MultiRecipientHeader, usize)> {
        MultiRecipientHeader::decode(data, &self.limits)
    }

    /// Parse a full encoded message under the configured limits.
    pub fn parse_message(&self, data: &[u8]) -> Result<MultiRecipientMessage> {
        MultiRecipientMessage::from_bytes(data, &self.limits)
    }

    /// Recover the plaintext as the recipient listed under `id`.
    ///
    /// # Errors
    ///
    /// - `RecipientNotFound` if `id` is not in the header
    /// - `Crypto(DecryptionFailed)` if the key does not unwrap or the body
    ///   fails authentication
    /// - `InvalidEncryptedDataLength` / `InvalidDataLength` for a body that
    ///   disagrees with the header
    pub fn decrypt_multiple_for_recipient(
        &self,
        message: &MultiRecipientMessage,
        id: &RecipientId,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        let header = message.header();
        let wrapped = header.wrapped_key_for(id).ok_or(ProtocolError::RecipientNotFound)?;

        let content_key = self.unwrap_key(wrapped, private_key)?;

        let Some((nonce, rest)) = message.body.split_at_checked(NONCE_SIZE) else {
            return Err(ProtocolError::InvalidEncryptedDataLength {
                expected: BODY_OVERHEAD,
                actual: message.body.len(),
            });
        };
        let Some((tag, ciphertext)) = rest.split_at_checked(TAG_SIZE) else {
            return Err(ProtocolError::InvalidEncryptedDataLength {
                expected: BODY_OVERHEAD,
                actual: message.body.len(),
            });
        };

        let plaintext = self.single.core().aead_decrypt(
            &content_key,
            nonce,
            tag,
            ciphertext,
            &header.associated_data(),
        )?;

        if plaintext.len() as u64 != header.data_length {
            return Err(ProtocolError::InvalidDataLength {
                expected: header.data_length,
                actual: plaintext.len() as u64,
            });
        }

        tracing::debug!(data_length = header.data_length, "opened multi-recipient message");

        Ok(plaintext)
    }

    fn check_recipient_count(&self, count: usize) -> Result<()> {
        if count == 0 {
            let max = self.limits.max_recipients;
            return Err(ProtocolError::InvalidRecipientCount { count, max });
        }
        if count > usize::from(self.limits.max_recipients) {
            return Err(ProtocolError::TooManyRecipients { count, max: self.limits.max_recipients });
        }
        Ok(())
    }

    fn wrap_key(
        &self,
        content_key: &SymmetricKey,
        recipient: &Recipient,
    ) -> Result<[u8; WRAPPED_KEY_SIZE]> {
        let wrapped = self.single.encrypt(
            recipient.public_key.as_bytes(),
            content_key.as_bytes(),
            EncryptionMode::Simple,
        )?;

        <[u8; WRAPPED_KEY_SIZE]>::try_from(wrapped.as_slice()).map_err(|_| {
            ProtocolError::InvalidEncryptedDataLength {
                expected: WRAPPED_KEY_SIZE,
                actual: wrapped.len(),
            }
        })
    }

    fn unwrap_key(
        &self,
        wrapped: &[u8; WRAPPED_KEY_SIZE],
        private_key: &PrivateKey,
    ) -> Result<SymmetricKey> {
        let key_bytes =
            Zeroizing::new(self.single.decrypt(private_key, wrapped, EncryptionMode::Simple)?);
        Ok(SymmetricKey::from_bytes(&key_bytes)?)
    }
}
