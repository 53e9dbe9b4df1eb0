//! Property-based tests for the primitive layer
//!
//! These tests verify the invariants the codecs rely on:
//!
//! 1. **Normalization**: `normalize` is idempotent and raw/prefixed agree
//! 2. **Agreement**: both sides of ECDH derive the same symmetric key
//! 3. **AEAD**: decrypt(encrypt(m)) == m, and any bit flip is rejected
//! 4. **Signatures**: verify(sign(m)) holds, mutations never verify

use lockbox_crypto::{
    CryptoCore, CryptoError, KeyPair, OsEntropy, PublicKey, TAG_SIZE, sign, verify,
};
use proptest::prelude::*;

fn key_pair() -> KeyPair {
    KeyPair::generate(&OsEntropy).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_normalize_idempotent(_seed in any::<u8>()) {
        let key_pair = key_pair();
        let from_raw = PublicKey::normalize(key_pair.public_key().raw()).unwrap();
        let from_prefixed = PublicKey::normalize(key_pair.public_key().as_bytes()).unwrap();
        let again = PublicKey::normalize(from_raw.as_bytes()).unwrap();

        prop_assert_eq!(from_raw, from_prefixed);
        prop_assert_eq!(from_raw, again);
    }

    #[test]
    fn prop_normalize_rejects_bad_lengths(bytes in prop::collection::vec(any::<u8>(), 0..130)) {
        prop_assume!(bytes.len() != PublicKey::RAW_SIZE && bytes.len() != PublicKey::SIZE);
        let result = PublicKey::normalize(&bytes);
        let rejected = matches!(result, Err(CryptoError::InvalidKey { .. }));
        prop_assert!(rejected, "length {} accepted", bytes.len());
    }

    #[test]
    fn prop_normalize_rejects_bad_prefix(
        prefix in any::<u8>(),
        body in prop::collection::vec(any::<u8>(), 64..=64),
    ) {
        prop_assume!(prefix != PublicKey::PREFIX);
        let mut bytes = vec![prefix];
        bytes.extend_from_slice(&body);
        prop_assert!(PublicKey::normalize(&bytes).is_err());
    }

    #[test]
    fn prop_aead_roundtrip(
        plaintext in prop::collection::vec(any::<u8>(), 0..1000),
        aad in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let core = CryptoCore::system();
        let key = core.random_symmetric_key();

        let envelope = core.encrypt(&key, &plaintext, &aad).unwrap();
        let decrypted = core
            .aead_decrypt(&key, &envelope.nonce, &envelope.tag, &envelope.ciphertext, &aad)
            .unwrap();

        prop_assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn prop_aead_detects_bit_flips(
        plaintext in prop::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let core = CryptoCore::system();
        let key = core.random_symmetric_key();
        let envelope = core.encrypt(&key, &plaintext, &[]).unwrap();

        // Flip one bit somewhere in tag || ciphertext
        let mut tag = envelope.tag;
        let mut ciphertext = envelope.ciphertext.clone();
        let index = position.index(TAG_SIZE + ciphertext.len());
        if index < TAG_SIZE {
            tag[index] ^= 1 << bit;
        } else {
            ciphertext[index - TAG_SIZE] ^= 1 << bit;
        }

        let result = core.aead_decrypt(&key, &envelope.nonce, &tag, &ciphertext, &[]);
        prop_assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn prop_sign_verify(message in prop::collection::vec(any::<u8>(), 0..512)) {
        let key_pair = key_pair();
        let signature = sign(key_pair.private_key(), &message);

        prop_assert!(verify(key_pair.public_key().as_bytes(), &message, signature.as_bytes()));
        prop_assert_eq!(signature, sign(key_pair.private_key(), &message));
    }

    #[test]
    fn prop_mutated_message_never_verifies(
        message in prop::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
    ) {
        let key_pair = key_pair();
        let signature = sign(key_pair.private_key(), &message);

        let mut mutated = message.clone();
        let index = position.index(mutated.len());
        mutated[index] ^= 0x01;

        prop_assert!(!verify(key_pair.public_key().as_bytes(), &mutated, signature.as_bytes()));
    }

    #[test]
    fn prop_garbage_signature_is_false(
        garbage in prop::collection::vec(any::<u8>(), 0..100),
    ) {
        let key_pair = key_pair();
        // Never panics, never errors
        let _ = verify(key_pair.public_key().as_bytes(), b"message", &garbage);
    }
}

#[test]
fn ecdh_both_sides_agree() {
    let core = CryptoCore::system();

    for _ in 0..16 {
        let recipient = key_pair();
        let ephemeral = core.generate_ephemeral_key_pair().unwrap();
        let ephemeral_public = *ephemeral.public_key();

        let sender_key =
            ephemeral.diffie_hellman(recipient.public_key().raw()).unwrap().symmetric_key();
        let recipient_key = core
            .compute_shared_secret(recipient.private_key(), ephemeral_public.as_bytes())
            .unwrap()
            .symmetric_key();

        assert_eq!(sender_key, recipient_key);
    }
}

#[test]
fn ecdh_with_wrong_private_key_disagrees() {
    let core = CryptoCore::system();
    let recipient = key_pair();
    let intruder = key_pair();
    let ephemeral = core.generate_ephemeral_key_pair().unwrap();
    let ephemeral_public = *ephemeral.public_key();

    let sender_key =
        ephemeral.diffie_hellman(recipient.public_key().as_bytes()).unwrap().symmetric_key();
    let intruder_key = core
        .compute_shared_secret(intruder.private_key(), ephemeral_public.as_bytes())
        .unwrap()
        .symmetric_key();

    assert_ne!(sender_key, intruder_key);
}
