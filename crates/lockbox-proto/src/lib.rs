//! Lockbox Wire Formats
//!
//! Binary encodings for hybrid ECIES messages built on `lockbox-crypto`.
//!
//! # Formats
//!
//! ```text
//! single-recipient (simple):  eph[65] | nonce[24] | tag[16] | ciphertext
//! single-recipient (single):  eph[65] | nonce[24] | tag[16] | len[4] | ciphertext
//! multi-recipient:            data_len[8] | count[2] | id[16]*n | wrapped[137]*n
//!                             | nonce[24] | tag[16] | ciphertext
//! typed envelope:             type[1] | one of the above
//! stream:                     single-mode message*
//! ```
//!
//! All integers are big-endian. Fixed-width headers are parsed zero-copy with
//! `zerocopy`, and every length read from the wire is checked against the
//! buffer before it is used.
//!
//! # Components
//!
//! - [`SingleRecipientCodec`]: one ephemeral ECDH per message
//! - [`MultiRecipientCodec`]: one content key wrapped per recipient
//! - [`StreamCodec`]: block-wise single-mode messages
//! - [`LengthCalculator`] / [`BlockLengthCalculator`]: size arithmetic
//! - [`Lockbox`]: facade over all of the above

#![deny(missing_docs)]

pub mod config;
pub mod envelope;
pub mod errors;
pub mod length;
pub mod lockbox;
pub mod multi;
pub mod recipient;
pub mod single;
pub mod stream;

pub use config::Limits;
pub use envelope::EncryptionType;
pub use errors::{ProtocolError, Result};
pub use length::{BlockLengthCalculator, LengthCalculator};
pub use lockbox::Lockbox;
pub use multi::{
    BODY_OVERHEAD, MultiRecipientCodec, MultiRecipientHeader, MultiRecipientMessage,
    PER_RECIPIENT_SIZE, WRAPPED_KEY_SIZE,
};
pub use recipient::{Recipient, RecipientId};
pub use single::{
    Decrypted, EncryptionMode, EnvelopeHeader, LENGTH_PREFIX_SIZE, ParsedHeader,
    SingleRecipientCodec,
};
pub use stream::{DEFAULT_BLOCK_SIZE, StreamCodec};
