//! Plaintext and wire length arithmetic.
//!
//! Overheads come from the codecs' own constants, so a layout change cannot
//! leave the calculators stale.

use crate::{
    errors::{ProtocolError, Result},
    multi::{BODY_OVERHEAD, MultiRecipientHeader},
    single::EncryptionMode,
};

/// Length conversion for one message with a fixed overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthCalculator {
    overhead: usize,
}

impl LengthCalculator {
    /// Calculator for an arbitrary per-message overhead.
    #[must_use]
    pub const fn per_message(overhead: usize) -> Self {
        Self { overhead }
    }

    /// Single-recipient message in `mode` (105 or 109 bytes of overhead).
    #[must_use]
    pub const fn for_mode(mode: EncryptionMode) -> Self {
        Self::per_message(mode.overhead())
    }

    /// Multi-recipient message addressed to `recipient_count` recipients.
    #[must_use]
    pub const fn for_recipients(recipient_count: u16) -> Self {
        Self::per_message(MultiRecipientHeader::size_for(recipient_count as usize) + BODY_OVERHEAD)
    }

    /// Bytes added to every plaintext.
    #[must_use]
    pub const fn overhead(self) -> usize {
        self.overhead
    }

    /// Wire length of a `plaintext_len`-byte plaintext.
    ///
    /// # Errors
    ///
    /// - `DataLengthOutOfRange` if the result does not fit in `usize`
    pub fn encrypted_length(self, plaintext_len: usize) -> Result<usize> {
        plaintext_len.checked_add(self.overhead).ok_or(ProtocolError::DataLengthOutOfRange {
            length: plaintext_len as u64,
            max: (usize::MAX - self.overhead) as u64,
        })
    }

    /// Plaintext length of an `encrypted_len`-byte message.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` if shorter than the overhead
    pub fn decrypted_length(self, encrypted_len: usize) -> Result<usize> {
        encrypted_len.checked_sub(self.overhead).ok_or(ProtocolError::InvalidEncryptedDataLength {
            expected: self.overhead,
            actual: encrypted_len,
        })
    }
}

/// Length conversion for plaintext split into fixed-size encrypted blocks.
///
/// Every block but the last is exactly `block_size` bytes on the wire; the
/// last holds the remainder plus the overhead. An empty plaintext produces no
/// blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLengthCalculator {
    block_size: usize,
    overhead: usize,
}

impl BlockLengthCalculator {
    /// Calculator for `block_size`-byte blocks carrying `overhead` each.
    ///
    /// # Errors
    ///
    /// - `InvalidBlockSize` if a block cannot hold at least one plaintext
    ///   byte
    pub fn new(block_size: usize, overhead: usize) -> Result<Self> {
        if block_size <= overhead {
            return Err(ProtocolError::InvalidBlockSize { block_size, overhead });
        }
        Ok(Self { block_size, overhead })
    }

    /// Blocks sealed as single-recipient messages in `mode`.
    pub fn for_mode(block_size: usize, mode: EncryptionMode) -> Result<Self> {
        Self::new(block_size, mode.overhead())
    }

    /// Encrypted block size.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Plaintext bytes per full block.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.block_size - self.overhead
    }

    /// Number of blocks a `plaintext_len`-byte plaintext occupies.
    #[must_use]
    pub const fn block_count(&self, plaintext_len: usize) -> usize {
        plaintext_len.div_ceil(self.capacity())
    }

    /// Wire length of a `plaintext_len`-byte plaintext.
    ///
    /// # Errors
    ///
    /// - `DataLengthOutOfRange` if the result does not fit in `usize`
    pub fn encrypted_length(&self, plaintext_len: usize) -> Result<usize> {
        let capacity = self.capacity();
        let full = plaintext_len / capacity;
        let remainder = plaintext_len % capacity;
        let tail = if remainder > 0 { remainder + self.overhead } else { 0 };

        full.checked_mul(self.block_size).and_then(|len| len.checked_add(tail)).ok_or(
            ProtocolError::DataLengthOutOfRange {
                length: plaintext_len as u64,
                max: usize::MAX as u64,
            },
        )
    }

    /// Plaintext length of an `encrypted_len`-byte block sequence.
    ///
    /// # Errors
    ///
    /// - `InvalidEncryptedDataLength` if the trailing partial block is not
    ///   longer than the overhead
    pub fn decrypted_length(&self, encrypted_len: usize) -> Result<usize> {
        let full = encrypted_len / self.block_size;
        let remainder = encrypted_len % self.block_size;

        let tail = match remainder {
            0 => 0,
            r if r > self.overhead => r - self.overhead,
            _ => {
                return Err(ProtocolError::InvalidEncryptedDataLength {
                    expected: full * self.block_size + self.overhead + 1,
                    actual: encrypted_len,
                });
            },
        };

        Ok(full * self.capacity() + tail)
    }
}
