//! Deterministic ECDSA signatures over secp256k1.
//!
//! Messages are hashed with SHA-256 and signed with an RFC 6979 nonce, so the
//! same key and message always produce the same signature. Signatures are
//! encoded as `r || s` (64 bytes) with `s` normalized to the low half of the
//! order.

use k256::ecdsa::{
    SigningKey, VerifyingKey,
    signature::{Signer, Verifier},
};

use crate::keys::{PrivateKey, PublicKey};

/// Fixed-width `r || s` signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; Signature::SIZE]);

impl Signature {
    /// Encoded width (two 32-byte scalars)
    pub const SIZE: usize = 64;

    /// Wrap encoded signature bytes. `None` if `bytes` is not 64 bytes long.
    ///
    /// This only checks the width; scalar validity is checked by [`verify`].
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; Self::SIZE]>::try_from(bytes).ok().map(Self)
    }

    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Signature(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        f.write_str(")")
    }
}

/// Sign `message` with `private_key`.
pub fn sign(private_key: &PrivateKey, message: &[u8]) -> Signature {
    let signing_key = SigningKey::from(private_key.secret());
    let signature: k256::ecdsa::Signature = signing_key.sign(message);

    let mut encoded = [0u8; Signature::SIZE];
    encoded.copy_from_slice(&signature.to_bytes());
    Signature(encoded)
}

/// Verify `signature` over `message` against `public_key`.
///
/// Accepts raw or prefixed public keys. Returns `false` for a malformed key,
/// a signature of the wrong width or with out-of-range scalars, and for any
/// cryptographic mismatch. Never errors.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(public_key) = PublicKey::normalize(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(public_key.as_bytes()) else {
        return false;
    };
    let Ok(signature) = k256::ecdsa::Signature::from_slice(signature) else {
        return false;
    };

    verifying_key.verify(message, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entropy::SeededEntropy, keys::KeyPair};

    fn key_pair(seed: u64) -> KeyPair {
        KeyPair::generate(&SeededEntropy::from_seed(seed)).unwrap()
    }

    #[test]
    fn sign_verify_roundtrip() {
        let key_pair = key_pair(1);
        let signature = sign(key_pair.private_key(), b"ballot #42");

        assert!(verify(key_pair.public_key().as_bytes(), b"ballot #42", signature.as_bytes()));
    }

    #[test]
    fn verify_accepts_raw_public_key() {
        let key_pair = key_pair(2);
        let signature = sign(key_pair.private_key(), b"message");

        assert!(verify(key_pair.public_key().raw(), b"message", signature.as_bytes()));
    }

    #[test]
    fn signing_is_deterministic() {
        let key_pair = key_pair(3);

        let first = sign(key_pair.private_key(), b"same message");
        let second = sign(key_pair.private_key(), b"same message");

        assert_eq!(first, second);
    }

    #[test]
    fn different_messages_produce_different_signatures() {
        let key_pair = key_pair(4);
        assert_ne!(sign(key_pair.private_key(), b"a"), sign(key_pair.private_key(), b"b"));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let signer = key_pair(5);
        let other = key_pair(6);
        let signature = sign(signer.private_key(), b"message");

        assert!(!verify(other.public_key().as_bytes(), b"message", signature.as_bytes()));
    }

    #[test]
    fn verify_rejects_mutated_message() {
        let key_pair = key_pair(7);
        let signature = sign(key_pair.private_key(), b"message");

        assert!(!verify(key_pair.public_key().as_bytes(), b"messagf", signature.as_bytes()));
    }

    #[test]
    fn verify_returns_false_on_malformed_input() {
        let key_pair = key_pair(8);
        let signature = sign(key_pair.private_key(), b"message");
        let public_key = key_pair.public_key().as_bytes();

        assert!(!verify(public_key, b"message", &signature.as_bytes()[..63]));
        assert!(!verify(public_key, b"message", &[0u8; 64]));
        assert!(!verify(public_key, b"message", &[0xFF; 64]));
        assert!(!verify(&public_key[..33], b"message", signature.as_bytes()));
        assert!(!verify(&[0x01; 64], b"message", signature.as_bytes()));
    }

    #[test]
    fn from_slice_checks_width() {
        assert!(Signature::from_slice(&[0u8; 63]).is_none());
        assert!(Signature::from_slice(&[0u8; 64]).is_some());
    }
}
