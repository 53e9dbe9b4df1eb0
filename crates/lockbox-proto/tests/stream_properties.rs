//! Property-based tests for block streams and typed envelopes

use lockbox_crypto::{CryptoCore, SeededEntropy};
use lockbox_proto::{
    BlockLengthCalculator, EncryptionMode, EncryptionType, Limits, Lockbox, ProtocolError,
    Recipient,
};
use proptest::prelude::*;

fn lockbox(seed: u64) -> Lockbox<SeededEntropy> {
    Lockbox::new(CryptoCore::new(SeededEntropy::from_seed(seed)), Limits::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_stream_length_matches_block_calculator(
        seed in any::<u64>(),
        block_size in 110usize..400,
        plaintext in prop::collection::vec(any::<u8>(), 0..2048),
    ) {
        let lockbox = lockbox(seed);
        let key_pair = lockbox.generate_key_pair().unwrap();
        let calc = BlockLengthCalculator::for_mode(block_size, EncryptionMode::Single).unwrap();

        let wire = lockbox
            .encrypt_stream(key_pair.public_key().as_bytes(), &plaintext, block_size)
            .unwrap();

        prop_assert_eq!(calc.encrypted_length(plaintext.len()), Ok(wire.len()));
        prop_assert_eq!(calc.decrypted_length(wire.len()), Ok(plaintext.len()));

        let decrypted = lockbox.decrypt_stream(key_pair.private_key(), &wire, block_size).unwrap();
        prop_assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn prop_block_lengths_are_inverse(
        block_size in 2usize..10_000,
        overhead_ratio in 0.0f64..1.0,
        plaintext_len in 0usize..1_000_000,
    ) {
        let overhead = ((block_size - 1) as f64 * overhead_ratio) as usize;
        let calc = BlockLengthCalculator::new(block_size, overhead).unwrap();

        let encrypted = calc.encrypted_length(plaintext_len).unwrap();
        prop_assert_eq!(calc.decrypted_length(encrypted), Ok(plaintext_len));
    }

    #[test]
    fn prop_typed_envelope_detects_mode(
        seed in any::<u64>(),
        plaintext in prop::collection::vec(any::<u8>(), 1..512),
        kind in prop_oneof![
            Just(EncryptionType::Simple),
            Just(EncryptionType::Single),
            Just(EncryptionType::Multiple),
        ],
    ) {
        let lockbox = lockbox(seed);
        let key_pair = lockbox.generate_key_pair().unwrap();
        let public_key = key_pair.public_key().as_bytes();

        let sealed = match kind.mode() {
            Some(mode) => lockbox.seal(public_key, &plaintext, mode).unwrap(),
            None => lockbox
                .seal_multiple(&[Recipient::from_public_key(*key_pair.public_key())], &plaintext)
                .unwrap(),
        };

        prop_assert_eq!(EncryptionType::split(&sealed).map(|(k, _)| k), Ok(kind));
        prop_assert_eq!(lockbox.open(key_pair.private_key(), &sealed).unwrap(), plaintext);
    }
}

#[test]
fn unknown_type_byte_is_rejected() {
    let lockbox = lockbox(1);
    let key_pair = lockbox.generate_key_pair().unwrap();

    let mut sealed =
        lockbox.seal(key_pair.public_key().as_bytes(), b"x", EncryptionMode::Simple).unwrap();
    sealed[0] = 0;

    assert_eq!(
        lockbox.open(key_pair.private_key(), &sealed),
        Err(ProtocolError::InvalidEncryptionType(0))
    );
}

#[test]
fn reordered_stream_blocks_still_authenticate_individually() {
    let lockbox = lockbox(2);
    let key_pair = lockbox.generate_key_pair().unwrap();
    let stream = lockbox.stream(120).unwrap();
    let capacity = stream.lengths().capacity();

    let plaintext: Vec<u8> = (0..(capacity * 2) as u8).collect();
    let wire = stream.encrypt(key_pair.public_key().as_bytes(), &plaintext).unwrap();

    let (first, second) = wire.split_at(120);
    let swapped = [second, first].concat();

    let decrypted = stream.decrypt(key_pair.private_key(), &swapped).unwrap();
    assert_eq!(decrypted[..capacity], plaintext[capacity..]);
}
