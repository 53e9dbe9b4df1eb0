//! Key agreement and AEAD primitives.
//!
//! [`CryptoCore`] owns the only randomness in the engine (through its
//! [`Entropy`]) and exposes the three primitives the codecs are built from:
//! ephemeral key generation, ECDH, and `XChaCha20-Poly1305` with detached
//! tags.
//!
//! # Security
//!
//! - Ephemeral secrets are consumed by [`EphemeralKeyPair::diffie_hellman`]
//!   and cannot be read back out
//! - [`SharedSecret`] and [`SymmetricKey`] zeroize on drop
//! - Nonces are drawn fresh per call; with a fresh ephemeral key per message
//!   a (key, nonce) pair is never reused
//! - AEAD failures collapse to [`CryptoError::DecryptionFailed`]

use chacha20poly1305::{
    Tag, XChaCha20Poly1305, XNonce,
    aead::{AeadInPlace, KeyInit},
};
use k256::SecretKey;
use zeroize::Zeroize;

use crate::{
    entropy::{Entropy, OsEntropy},
    error::CryptoError,
    keys::{self, KeyPair, PrivateKey, PublicKey},
};

/// `XChaCha20` nonce width (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag width (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Symmetric key width (32 bytes)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// 32-byte AEAD key. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Wrap raw key bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `bytes` is not [`SYMMETRIC_KEY_SIZE`] long
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SYMMETRIC_KEY_SIZE {
            return Err(CryptoError::invalid_key(format!(
                "symmetric key must be {SYMMETRIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut key = [0u8; SYMMETRIC_KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// ECDH output: the x-coordinate of the shared point. Zeroized on drop.
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Leading [`SYMMETRIC_KEY_SIZE`] bytes of the secret as an AEAD key.
    ///
    /// Any trailing bytes are never used as key material.
    pub fn symmetric_key(&self) -> SymmetricKey {
        let mut key = [0u8; SYMMETRIC_KEY_SIZE];
        key.copy_from_slice(&self.0[..SYMMETRIC_KEY_SIZE]);
        SymmetricKey(key)
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Single-use key pair for one encryption.
///
/// The secret half never leaves this type: the only way to use it is
/// [`Self::diffie_hellman`], which consumes the pair.
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public_key: PublicKey,
}

impl EphemeralKeyPair {
    /// Public half, to be sent alongside the ciphertext.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Agree on a shared secret with `peer` and discard the ephemeral secret.
    pub fn diffie_hellman(self, peer: &[u8]) -> Result<SharedSecret, CryptoError> {
        agree(&self.secret, peer)
    }
}

/// Output of one AEAD encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadEnvelope {
    /// Fresh random nonce
    pub nonce: [u8; NONCE_SIZE],
    /// Poly1305 authentication tag
    pub tag: [u8; TAG_SIZE],
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
}

/// Primitive operations over an injected entropy source.
#[derive(Debug, Clone, Default)]
pub struct CryptoCore<E: Entropy = OsEntropy> {
    entropy: E,
}

impl CryptoCore<OsEntropy> {
    /// Core backed by the operating system RNG.
    pub fn system() -> Self {
        Self::new(OsEntropy)
    }
}

impl<E: Entropy> CryptoCore<E> {
    /// Create a core drawing randomness from `entropy`.
    pub fn new(entropy: E) -> Self {
        Self { entropy }
    }

    /// Entropy source used by this core.
    pub fn entropy(&self) -> &E {
        &self.entropy
    }

    /// Generate a fresh ephemeral key pair.
    pub fn generate_ephemeral_key_pair(&self) -> Result<EphemeralKeyPair, CryptoError> {
        let secret = keys::generate_secret(&self.entropy)?;
        let public_key = PublicKey::from_point(&secret.public_key());
        Ok(EphemeralKeyPair { secret, public_key })
    }

    /// Generate a long-term key pair.
    pub fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        KeyPair::generate(&self.entropy)
    }

    /// ECDH between a static private key and a peer public key.
    ///
    /// The peer key is normalized first, so both raw and prefixed encodings
    /// are accepted.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the peer key has the wrong length or prefix
    /// - `InvalidRecipientPublicKey` if the peer key is not a curve point
    /// - `SecretComputationFailed` if the agreement degenerates
    pub fn compute_shared_secret(
        &self,
        private_key: &PrivateKey,
        peer: &[u8],
    ) -> Result<SharedSecret, CryptoError> {
        agree(private_key.secret(), peer)
    }

    /// Fresh random nonce.
    pub fn random_nonce(&self) -> [u8; NONCE_SIZE] {
        self.entropy.random_array()
    }

    /// Fresh random symmetric key.
    pub fn random_symmetric_key(&self) -> SymmetricKey {
        SymmetricKey(self.entropy.random_array())
    }

    /// Encrypt under a fresh random nonce.
    pub fn encrypt(
        &self,
        key: &SymmetricKey,
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadEnvelope, CryptoError> {
        let nonce = self.random_nonce();
        self.aead_encrypt(key, &nonce, plaintext, aad)
    }

    /// Encrypt with an explicit nonce. `aad` may be empty.
    ///
    /// # Errors
    ///
    /// - `InvalidNonceLength` if `nonce` is not [`NONCE_SIZE`] bytes
    /// - `EncryptionFailed` if the plaintext exceeds the cipher's limit
    pub fn aead_encrypt(
        &self,
        key: &SymmetricKey,
        nonce: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<AeadEnvelope, CryptoError> {
        let nonce = fixed::<NONCE_SIZE>(nonce).map_err(|actual| {
            CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual }
        })?;

        let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
        let mut ciphertext = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(XNonce::from_slice(&nonce), aad, &mut ciphertext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(&tag);

        Ok(AeadEnvelope { nonce, tag: tag_bytes, ciphertext })
    }

    /// Verify and decrypt. `aad` must match what was used to encrypt.
    ///
    /// Fails closed: no plaintext is returned unless the tag verifies.
    ///
    /// # Errors
    ///
    /// - `InvalidNonceLength` / `InvalidAuthTagLength` on wrong slice widths
    /// - `DecryptionFailed` on any authentication failure
    pub fn aead_decrypt(
        &self,
        key: &SymmetricKey,
        nonce: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let nonce = fixed::<NONCE_SIZE>(nonce).map_err(|actual| {
            CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual }
        })?;
        let tag = fixed::<TAG_SIZE>(tag)
            .map_err(|actual| CryptoError::InvalidAuthTagLength { expected: TAG_SIZE, actual })?;

        let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
        let mut buffer = ciphertext.to_vec();
        let verified = cipher.decrypt_in_place_detached(
            XNonce::from_slice(&nonce),
            aad,
            &mut buffer,
            Tag::from_slice(&tag),
        );

        if verified.is_err() {
            buffer.zeroize();
            return Err(CryptoError::DecryptionFailed);
        }

        Ok(buffer)
    }
}

/// Copy a slice into a fixed array, returning the actual length on mismatch.
fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N], usize> {
    <[u8; N]>::try_from(bytes).map_err(|_| bytes.len())
}

fn agree(secret: &SecretKey, peer: &[u8]) -> Result<SharedSecret, CryptoError> {
    let peer = PublicKey::normalize(peer)?;
    let point = peer.to_point()?;

    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), point.as_affine());
    let mut x = [0u8; 32];
    x.copy_from_slice(shared.raw_secret_bytes());

    if x.iter().all(|&byte| byte == 0) {
        return Err(CryptoError::SecretComputationFailed);
    }

    Ok(SharedSecret(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::SeededEntropy;

    fn seeded_core(seed: u64) -> CryptoCore<SeededEntropy> {
        CryptoCore::new(SeededEntropy::from_seed(seed))
    }

    #[test]
    fn ecdh_agrees_from_both_sides() {
        let core = seeded_core(1);
        let recipient = core.generate_key_pair().unwrap();
        let ephemeral = core.generate_ephemeral_key_pair().unwrap();
        let ephemeral_public = *ephemeral.public_key();

        let sender_secret = ephemeral.diffie_hellman(recipient.public_key().as_bytes()).unwrap();
        let recipient_secret = core
            .compute_shared_secret(recipient.private_key(), ephemeral_public.as_bytes())
            .unwrap();

        assert_eq!(sender_secret.symmetric_key(), recipient_secret.symmetric_key());
    }

    #[test]
    fn ecdh_accepts_raw_peer_key() {
        let core = seeded_core(2);
        let a = core.generate_key_pair().unwrap();
        let b = core.generate_key_pair().unwrap();

        let prefixed = core.compute_shared_secret(a.private_key(), b.public_key().as_bytes());
        let raw = core.compute_shared_secret(a.private_key(), b.public_key().raw());

        assert_eq!(prefixed.unwrap().symmetric_key(), raw.unwrap().symmetric_key());
    }

    #[test]
    fn ecdh_rejects_off_curve_peer() {
        let core = seeded_core(3);
        let a = core.generate_key_pair().unwrap();

        let result = core.compute_shared_secret(a.private_key(), &[0x01; 64]);
        assert!(matches!(result, Err(CryptoError::InvalidRecipientPublicKey)));
    }

    #[test]
    fn ecdh_rejects_malformed_peer() {
        let core = seeded_core(4);
        let a = core.generate_key_pair().unwrap();

        let result = core.compute_shared_secret(a.private_key(), &[0x04; 33]);
        assert!(matches!(result, Err(CryptoError::InvalidKey { .. })));
    }

    #[test]
    fn aead_roundtrip_with_aad() {
        let core = seeded_core(5);
        let key = core.random_symmetric_key();

        let envelope = core.encrypt(&key, b"attack at dawn", b"header").unwrap();
        let plaintext = core
            .aead_decrypt(&key, &envelope.nonce, &envelope.tag, &envelope.ciphertext, b"header")
            .unwrap();

        assert_eq!(plaintext, b"attack at dawn");
        assert_eq!(envelope.ciphertext.len(), plaintext.len());
    }

    #[test]
    fn aead_rejects_wrong_aad() {
        let core = seeded_core(6);
        let key = core.random_symmetric_key();

        let envelope = core.encrypt(&key, b"payload", b"header").unwrap();
        let result =
            core.aead_decrypt(&key, &envelope.nonce, &envelope.tag, &envelope.ciphertext, b"other");

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn aead_rejects_wrong_key() {
        let core = seeded_core(7);
        let key = core.random_symmetric_key();
        let wrong = core.random_symmetric_key();

        let envelope = core.encrypt(&key, b"payload", &[]).unwrap();
        let result =
            core.aead_decrypt(&wrong, &envelope.nonce, &envelope.tag, &envelope.ciphertext, &[]);

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn aead_rejects_truncated_ciphertext() {
        let core = seeded_core(8);
        let key = core.random_symmetric_key();

        let envelope = core.encrypt(&key, b"payload", &[]).unwrap();
        let truncated = &envelope.ciphertext[..envelope.ciphertext.len() - 1];
        let result = core.aead_decrypt(&key, &envelope.nonce, &envelope.tag, truncated, &[]);

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn aead_validates_slice_widths() {
        let core = seeded_core(9);
        let key = core.random_symmetric_key();

        let short_nonce = core.aead_encrypt(&key, &[0u8; 12], b"x", &[]);
        assert_eq!(short_nonce, Err(CryptoError::InvalidNonceLength { expected: 24, actual: 12 }));

        let short_tag = core.aead_decrypt(&key, &[0u8; NONCE_SIZE], &[0u8; 15], b"x", &[]);
        assert_eq!(short_tag, Err(CryptoError::InvalidAuthTagLength { expected: 16, actual: 15 }));
    }

    #[test]
    fn nonces_are_fresh() {
        let core = seeded_core(10);
        assert_ne!(core.random_nonce(), core.random_nonce());
    }

    #[test]
    fn symmetric_key_rejects_wrong_length() {
        assert!(SymmetricKey::from_bytes(&[0u8; 31]).is_err());
        assert!(SymmetricKey::from_bytes(&[0u8; 32]).is_ok());
    }
}
