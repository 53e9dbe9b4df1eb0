//! Chunked encryption of large plaintexts.
//!
//! The plaintext is cut into [`BlockLengthCalculator::capacity`]-sized pieces,
//! each sealed as an independent single-mode message and concatenated.
//! Decryption walks the buffer one message at a time using the length
//! prefixes.
//!
//! Chunks are authenticated individually; their order is not bound, so a
//! caller that needs ordering must authenticate the whole blob (for example
//! with a signature).

use lockbox_crypto::{Entropy, OsEntropy, PrivateKey, PublicKey};

use crate::{
    errors::Result,
    length::BlockLengthCalculator,
    single::{EncryptionMode, SingleRecipientCodec},
};

/// Default encrypted block size (64 KiB)
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// Block-wise encoder built on the single-recipient codec.
#[derive(Debug, Clone)]
pub struct StreamCodec<E: Entropy = OsEntropy> {
    single: SingleRecipientCodec<E>,
    lengths: BlockLengthCalculator,
}

impl<E: Entropy> StreamCodec<E> {
    /// Codec producing `block_size`-byte encrypted blocks.
    ///
    /// # Errors
    ///
    /// - `InvalidBlockSize` if `block_size` leaves no room for plaintext
    pub fn new(single: SingleRecipientCodec<E>, block_size: usize) -> Result<Self> {
        let lengths = BlockLengthCalculator::for_mode(block_size, EncryptionMode::Single)?;
        Ok(Self { single, lengths })
    }

    /// Length arithmetic for this codec's block size.
    pub fn lengths(&self) -> &BlockLengthCalculator {
        &self.lengths
    }

    /// Encrypt `plaintext` for `recipient_public_key` block by block.
    ///
    /// # Errors
    ///
    /// - `Crypto(..)` for a bad recipient key
    pub fn encrypt(&self, recipient_public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let recipient = PublicKey::normalize(recipient_public_key)?;

        let mut out = Vec::with_capacity(self.lengths.encrypted_length(plaintext.len())?);
        for chunk in plaintext.chunks(self.lengths.capacity()) {
            let block = self.single.encrypt(recipient.as_bytes(), chunk, EncryptionMode::Single)?;
            out.extend_from_slice(&block);
        }

        tracing::debug!(
            blocks = self.lengths.block_count(plaintext.len()),
            plaintext_len = plaintext.len(),
            wire_len = out.len(),
            "sealed stream"
        );

        Ok(out)
    }

    /// Decrypt a sequence of blocks produced by [`Self::encrypt`].
    ///
    /// # Errors
    ///
    /// - Any error from [`SingleRecipientCodec::decrypt_with_header`] for the
    ///   first block that fails
    pub fn decrypt(&self, private_key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>> {
        let mut plaintext = Vec::with_capacity(data.len());
        let mut offset = 0;
        let mut blocks = 0usize;

        while offset < data.len() {
            let block = self.single.decrypt_with_header(
                private_key,
                &data[offset..],
                EncryptionMode::Single,
            )?;
            offset += block.consumed_bytes;
            blocks += 1;
            plaintext.extend_from_slice(&block.plaintext);
        }

        tracing::debug!(blocks, plaintext_len = plaintext.len(), "opened stream");

        Ok(plaintext)
    }
}
