//! Fuzz target for multi-recipient header boundary conditions
//!
//! # Strategy
//!
//! - Data length: zero, one, at-limit, just-over-limit, u64::MAX, random
//! - Recipient count: zero, one, at-limit, just-over-limit, u16::MAX, random
//! - Recipient table: complete, truncated at an arbitrary point, padded
//! - Recipient ids: distinct or all identical
//!
//! # Invariants
//!
//! - Count of zero or above the limit MUST return `InvalidRecipientCount`
//! - Data length of zero or above the limit MUST return `DataLengthOutOfRange`
//! - A short recipient table MUST return `InvalidEncryptedDataLength`
//! - A repeated id MUST return `DuplicateRecipientId`
//! - A successful parse consumes exactly `10 + count * 153` bytes and
//!   re-encodes to the same bytes
//! - Never panic, never allocate from an unchecked length

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockbox_proto::{Limits, MultiRecipientHeader, PER_RECIPIENT_SIZE, ProtocolError};

const LIMITS: Limits = Limits { max_recipients: 8, max_data_size: 1 << 20 };

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryHeader {
    data_length: DataLength,
    count: RecipientCount,
    table: Table,
    fill: u8,
    repeat_ids: bool,
}

#[derive(Debug, Clone, Arbitrary)]
enum DataLength {
    Zero,
    One,
    AtLimit,
    JustOverLimit,
    Max,
    Random(u64),
}

#[derive(Debug, Clone, Arbitrary)]
enum RecipientCount {
    Zero,
    One,
    AtLimit,
    JustOverLimit,
    Max,
    Random(u16),
}

#[derive(Debug, Clone, Arbitrary)]
enum Table {
    Complete,
    Truncated(u16),
    Padded(u8),
}

impl BoundaryHeader {
    fn data_length(&self) -> u64 {
        match self.data_length {
            DataLength::Zero => 0,
            DataLength::One => 1,
            DataLength::AtLimit => LIMITS.max_data_size,
            DataLength::JustOverLimit => LIMITS.max_data_size + 1,
            DataLength::Max => u64::MAX,
            DataLength::Random(n) => n,
        }
    }

    fn count(&self) -> u16 {
        match self.count {
            RecipientCount::Zero => 0,
            RecipientCount::One => 1,
            RecipientCount::AtLimit => LIMITS.max_recipients,
            RecipientCount::JustOverLimit => LIMITS.max_recipients + 1,
            RecipientCount::Max => u16::MAX,
            RecipientCount::Random(n) => n,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let count = usize::from(self.count().min(LIMITS.max_recipients + 1));
        let mut table_len = count * PER_RECIPIENT_SIZE;
        match self.table {
            Table::Complete => {},
            Table::Truncated(cut) => table_len = table_len.saturating_sub(usize::from(cut) + 1),
            Table::Padded(extra) => table_len += usize::from(extra),
        }

        let mut out = Vec::with_capacity(10 + table_len);
        out.extend_from_slice(&self.data_length().to_be_bytes());
        out.extend_from_slice(&self.count().to_be_bytes());
        out.resize(10 + table_len, self.fill);

        if !self.repeat_ids {
            let ids_end = (10 + count * 16).min(out.len());
            for (index, id) in out[10..ids_end].chunks_exact_mut(16).enumerate() {
                id[..2].copy_from_slice(&(index as u16).to_be_bytes());
            }
        }
        out
    }
}

fuzz_target!(|input: BoundaryHeader| {
    let bytes = input.encode();
    let count = input.count();
    let data_length = input.data_length();

    match MultiRecipientHeader::decode(&bytes, &LIMITS) {
        Ok((header, consumed)) => {
            assert!(count >= 1 && count <= LIMITS.max_recipients);
            assert!(data_length >= 1 && data_length <= LIMITS.max_data_size);
            assert_eq!(consumed, MultiRecipientHeader::size_for(usize::from(count)));
            assert_eq!(header.recipient_ids().len(), usize::from(count));

            let mut encoded = Vec::new();
            header.encode(&mut encoded);
            assert_eq!(encoded, bytes[..consumed]);
        },
        Err(ProtocolError::InvalidRecipientCount { .. }) => {
            assert!(count == 0 || count > LIMITS.max_recipients);
        },
        Err(ProtocolError::DataLengthOutOfRange { .. }) => {
            assert!(data_length == 0 || data_length > LIMITS.max_data_size);
        },
        Err(ProtocolError::DuplicateRecipientId { id }) => {
            assert!(input.repeat_ids && count >= 2);
            assert_eq!(id.as_bytes(), &[input.fill; 16]);
        },
        Err(ProtocolError::InvalidEncryptedDataLength { expected, actual }) => {
            assert!(actual < expected);
            assert!(matches!(input.table, Table::Truncated(_)));
        },
        Err(other) => panic!("unexpected error: {other:?}"),
    }
});
