//! Codec limits.

/// Upper bounds enforced by the multi-recipient codec on both encode and
/// parse.
///
/// # Invariants
///
/// - `max_recipients` can never exceed what the 2-byte count field holds
/// - `max_data_size` bounds the 8-byte length field; lowering it bounds the
///   memory a forged header can make a parser commit to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum recipients per message
    pub max_recipients: u16,
    /// Maximum plaintext size in bytes
    pub max_data_size: u64,
}

impl Limits {
    /// Default recipient cap (full range of the count field)
    pub const MAX_RECIPIENTS: u16 = u16::MAX;

    /// Default plaintext cap (1 GiB)
    pub const MAX_DATA_SIZE: u64 = 1024 * 1024 * 1024;
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_recipients: Self::MAX_RECIPIENTS, max_data_size: Self::MAX_DATA_SIZE }
    }
}
