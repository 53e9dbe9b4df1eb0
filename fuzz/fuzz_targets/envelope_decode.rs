//! Fuzz target for decoding untrusted envelopes
//!
//! Feeds arbitrary bytes to every parsing entry point:
//! - Single-recipient header parsing and decryption in both modes
//! - Typed envelope dispatch
//! - Stream decryption
//!
//! The decoders should NEVER panic. Random input must never authenticate.

#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use lockbox_crypto::{CryptoCore, KeyPair, SeededEntropy};
use lockbox_proto::{EncryptionMode, Limits, Lockbox, SingleRecipientCodec};

static SETUP: LazyLock<(Lockbox<SeededEntropy>, KeyPair)> = LazyLock::new(|| {
    let lockbox = Lockbox::new(CryptoCore::new(SeededEntropy::from_seed(0)), Limits::default());
    let key_pair = lockbox.generate_key_pair().unwrap();
    (lockbox, key_pair)
});

fuzz_target!(|data: &[u8]| {
    let (lockbox, key_pair) = &*SETUP;
    let private_key = key_pair.private_key();

    let _ = SingleRecipientCodec::<SeededEntropy>::parse_header(data);

    for mode in [EncryptionMode::Simple, EncryptionMode::Single] {
        assert!(lockbox.decrypt_single(private_key, data, mode).is_err());
    }

    assert!(lockbox.open(private_key, data).is_err());

    if let Ok(stream) = lockbox.stream(256) {
        // empty input is a valid empty stream
        if !data.is_empty() {
            assert!(stream.decrypt(private_key, data).is_err());
        }
    }
});
