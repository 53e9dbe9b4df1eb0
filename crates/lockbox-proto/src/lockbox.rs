//! Facade over the codecs.

use lockbox_crypto::{CryptoCore, Entropy, KeyPair, OsEntropy, PrivateKey, Signature};

use crate::{
    config::Limits,
    envelope::EncryptionType,
    errors::Result,
    length::LengthCalculator,
    multi::{MultiRecipientCodec, MultiRecipientMessage},
    recipient::{Recipient, RecipientId},
    single::{EncryptionMode, SingleRecipientCodec},
    stream::StreamCodec,
};

/// Entry point bundling every message format behind one entropy source.
///
/// ```text
/// Lockbox
///  ├── SingleRecipientCodec ── CryptoCore<E>
///  └── MultiRecipientCodec ─── SingleRecipientCodec (key wrap) + Limits
/// ```
#[derive(Debug, Clone)]
pub struct Lockbox<E: Entropy = OsEntropy> {
    single: SingleRecipientCodec<E>,
    multi: MultiRecipientCodec<E>,
}

impl Lockbox<OsEntropy> {
    /// Lockbox on the OS RNG with default limits.
    #[must_use]
    pub fn system() -> Self {
        Self::new(CryptoCore::system(), Limits::default())
    }
}

impl Default for Lockbox<OsEntropy> {
    fn default() -> Self {
        Self::system()
    }
}

impl<E: Entropy> Lockbox<E> {
    /// Assemble the codecs around `core`.
    pub fn new(core: CryptoCore<E>, limits: Limits) -> Self {
        let single = SingleRecipientCodec::new(core);
        let multi = MultiRecipientCodec::new(single.clone(), limits);
        Self { single, multi }
    }

    /// Primitive layer.
    pub fn core(&self) -> &CryptoCore<E> {
        self.single.core()
    }

    /// Multi-recipient limits.
    pub fn limits(&self) -> &Limits {
        self.multi.limits()
    }

    /// Generate a long-term key pair from this lockbox's entropy.
    pub fn generate_key_pair(&self) -> Result<KeyPair> {
        Ok(self.core().generate_key_pair()?)
    }

    /// See [`SingleRecipientCodec::encrypt`].
    pub fn encrypt_single(
        &self,
        recipient_public_key: &[u8],
        plaintext: &[u8],
        mode: EncryptionMode,
    ) -> Result<Vec<u8>> {
        self.single.encrypt(recipient_public_key, plaintext, mode)
    }

    /// See [`SingleRecipientCodec::decrypt`].
    pub fn decrypt_single(
        &self,
        private_key: &PrivateKey,
        data: &[u8],
        mode: EncryptionMode,
    ) -> Result<Vec<u8>> {
        self.single.decrypt(private_key, data, mode)
    }

    /// See [`MultiRecipientCodec::encrypt_multiple`].
    pub fn encrypt_multiple(
        &self,
        recipients: &[Recipient],
        plaintext: &[u8],
    ) -> Result<MultiRecipientMessage> {
        self.multi.encrypt_multiple(recipients, plaintext)
    }

    /// Parse an encoded multi-recipient message and decrypt it as `id`.
    pub fn decrypt_multiple_for_recipient(
        &self,
        data: &[u8],
        id: &RecipientId,
        private_key: &PrivateKey,
    ) -> Result<Vec<u8>> {
        let message = self.multi.parse_message(data)?;
        self.multi.decrypt_multiple_for_recipient(&message, id, private_key)
    }

    /// Deterministic signature over `message`.
    #[must_use]
    pub fn sign(&self, private_key: &PrivateKey, message: &[u8]) -> Signature {
        lockbox_crypto::sign(private_key, message)
    }

    /// Check `signature` over `message`; `false` on any malformed input.
    #[must_use]
    pub fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        lockbox_crypto::verify(public_key, message, signature)
    }

    /// Single-recipient wire length for a `plaintext_len`-byte plaintext.
    pub fn encrypted_length(&self, plaintext_len: usize, mode: EncryptionMode) -> Result<usize> {
        LengthCalculator::for_mode(mode).encrypted_length(plaintext_len)
    }

    /// Plaintext length of an `encrypted_len`-byte single-recipient message.
    pub fn decrypted_length(&self, encrypted_len: usize, mode: EncryptionMode) -> Result<usize> {
        LengthCalculator::for_mode(mode).decrypted_length(encrypted_len)
    }

    /// Encrypt for one recipient and tag the result with its mode.
    pub fn seal(
        &self,
        recipient_public_key: &[u8],
        plaintext: &[u8],
        mode: EncryptionMode,
    ) -> Result<Vec<u8>> {
        let message = self.single.encrypt(recipient_public_key, plaintext, mode)?;
        Ok(EncryptionType::from(mode).prepend(&message))
    }

    /// Encrypt for many recipients and tag the result.
    pub fn seal_multiple(&self, recipients: &[Recipient], plaintext: &[u8]) -> Result<Vec<u8>> {
        let message = self.multi.encrypt_multiple(recipients, plaintext)?;
        Ok(EncryptionType::Multiple.prepend(&message.to_bytes()))
    }

    /// Open a typed envelope.
    ///
    /// For multi-recipient envelopes the recipient id is
    /// [`RecipientId::derive`]d from the private key's public half.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptionType` for an unknown type byte
    /// - Any error from the selected codec
    pub fn open(&self, private_key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>> {
        let id = RecipientId::derive(&private_key.public_key());
        self.open_as(&id, private_key, data)
    }

    /// Open a typed envelope, using `id` if it is multi-recipient.
    pub fn open_as(
        &self,
        id: &RecipientId,
        private_key: &PrivateKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let (kind, payload) = EncryptionType::split(data)?;
        tracing::debug!(?kind, payload_len = payload.len(), "opening typed envelope");

        match kind.mode() {
            Some(mode) => self.single.decrypt(private_key, payload, mode),
            None => self.decrypt_multiple_for_recipient(payload, id, private_key),
        }
    }

    /// Stream codec producing `block_size`-byte blocks.
    pub fn stream(&self, block_size: usize) -> Result<StreamCodec<E>> {
        StreamCodec::new(self.single.clone(), block_size)
    }

    /// See [`StreamCodec::encrypt`].
    pub fn encrypt_stream(
        &self,
        recipient_public_key: &[u8],
        plaintext: &[u8],
        block_size: usize,
    ) -> Result<Vec<u8>> {
        self.stream(block_size)?.encrypt(recipient_public_key, plaintext)
    }

    /// See [`StreamCodec::decrypt`].
    pub fn decrypt_stream(
        &self,
        private_key: &PrivateKey,
        data: &[u8],
        block_size: usize,
    ) -> Result<Vec<u8>> {
        self.stream(block_size)?.decrypt(private_key, data)
    }
}
