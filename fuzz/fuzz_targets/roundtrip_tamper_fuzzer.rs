//! Fuzz target for encrypt/decrypt round trips under tampering
//!
//! # Strategy
//!
//! - Seeded entropy so every crash reproduces exactly
//! - Single-recipient (both modes), multi-recipient and typed envelopes
//! - Optional single-byte corruption or truncation of the wire bytes
//!
//! # Invariants
//!
//! - Untouched messages always decrypt to the original plaintext
//! - Any corruption or truncation is rejected, never silently accepted
//! - Wire length always matches the length calculator

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lockbox_crypto::{CryptoCore, SeededEntropy};
use lockbox_proto::{EncryptionMode, LengthCalculator, Limits, Lockbox, Recipient, RecipientId};

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    format: Format,
    plaintext: Vec<u8>,
    tamper: Tamper,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Format {
    Simple,
    Single,
    Multiple { recipients: u8 },
    Typed,
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Tamper {
    None,
    Flip { position: u16, mask: u8 },
    Truncate { keep: u16 },
}

impl Tamper {
    /// Apply to `wire`; returns whether anything changed.
    fn apply(self, wire: &mut Vec<u8>) -> bool {
        if wire.is_empty() {
            return false;
        }
        match self {
            Tamper::None => false,
            Tamper::Flip { position, mask } => {
                if mask == 0 {
                    return false;
                }
                let index = usize::from(position) % wire.len();
                wire[index] ^= mask;
                true
            },
            Tamper::Truncate { keep } => {
                let keep = usize::from(keep) % wire.len();
                wire.truncate(keep);
                true
            },
        }
    }
}

fuzz_target!(|scenario: Scenario| {
    let core = CryptoCore::new(SeededEntropy::from_seed(scenario.seed));
    let lockbox = Lockbox::new(core, Limits::default());
    let key_pair = lockbox.generate_key_pair().unwrap();
    let public_key = key_pair.public_key().as_bytes();
    let private_key = key_pair.private_key();
    let plaintext = &scenario.plaintext;

    match scenario.format {
        Format::Simple | Format::Single => {
            let mode = match scenario.format {
                Format::Simple => EncryptionMode::Simple,
                _ => EncryptionMode::Single,
            };
            let mut wire = lockbox.encrypt_single(public_key, plaintext, mode).unwrap();
            let calc = LengthCalculator::for_mode(mode);
            assert_eq!(calc.encrypted_length(plaintext.len()), Ok(wire.len()));

            let tampered = scenario.tamper.apply(&mut wire);
            let result = lockbox.decrypt_single(private_key, &wire, mode);
            if tampered {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref(), Ok(plaintext));
            }
        },
        Format::Multiple { recipients } => {
            if plaintext.is_empty() {
                return;
            }
            let count = usize::from(recipients % 4) + 1;
            let mut group = vec![Recipient::from_public_key(*key_pair.public_key())];
            for _ in 1..count {
                let other = lockbox.generate_key_pair().unwrap();
                group.push(Recipient::from_public_key(*other.public_key()));
            }

            let mut wire = lockbox.encrypt_multiple(&group, plaintext).unwrap().to_bytes();
            let calc = LengthCalculator::for_recipients(count as u16);
            assert_eq!(calc.encrypted_length(plaintext.len()), Ok(wire.len()));
            assert_eq!(calc.decrypted_length(wire.len()), Ok(plaintext.len()));

            let id = RecipientId::derive(key_pair.public_key());
            let tampered = scenario.tamper.apply(&mut wire);
            let result = lockbox.decrypt_multiple_for_recipient(&wire, &id, private_key);
            if tampered {
                // corrupting another recipient's wrapped key does not affect us
                if let Ok(recovered) = result {
                    assert_eq!(&recovered, plaintext);
                }
            } else {
                assert_eq!(result.as_ref(), Ok(plaintext));
            }
        },
        Format::Typed => {
            let mut wire = lockbox.seal(public_key, plaintext, EncryptionMode::Single).unwrap();
            let tampered = scenario.tamper.apply(&mut wire);
            let result = lockbox.open(private_key, &wire);
            if tampered {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref(), Ok(plaintext));
            }
        },
    }
});
