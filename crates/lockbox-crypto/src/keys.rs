//! secp256k1 key material and the public key codec.
//!
//! A public key has two accepted encodings:
//!
//! ```text
//! raw:      x[32] || y[32]            (64 bytes)
//! prefixed: 0x04 || x[32] || y[32]    (65 bytes, SEC1 uncompressed)
//! ```
//!
//! [`PublicKey::normalize`] is the only way to build a [`PublicKey`] from
//! external bytes and always produces the prefixed form. Whether the point
//! lies on the curve is decided later, at key agreement or verification.

use std::fmt;

use k256::{SecretKey, elliptic_curve::sec1::ToEncodedPoint};
use zeroize::{Zeroize, Zeroizing};

use crate::{entropy::Entropy, error::CryptoError};

/// Candidates drawn before key generation gives up.
///
/// A uniformly random 32-byte string is out of range with probability
/// about 2^-128, so this bound is only reached by a broken entropy source.
const MAX_KEYGEN_ATTEMPTS: u32 = 16;

/// Public key in canonical prefixed encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PublicKey::SIZE]);

impl PublicKey {
    /// Width of the raw encoding (x || y)
    pub const RAW_SIZE: usize = 64;

    /// Width of the prefixed encoding
    pub const SIZE: usize = Self::RAW_SIZE + 1;

    /// Format tag of the prefixed encoding (SEC1 uncompressed point)
    pub const PREFIX: u8 = 0x04;

    /// Validate and canonicalize a public key.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the input is neither 64 bytes nor 65 bytes, or if a
    ///   65-byte input does not start with [`Self::PREFIX`]
    pub fn normalize(key: &[u8]) -> Result<Self, CryptoError> {
        let mut prefixed = [0u8; Self::SIZE];

        match key.len() {
            Self::RAW_SIZE => {
                prefixed[0] = Self::PREFIX;
                prefixed[1..].copy_from_slice(key);
            },
            Self::SIZE => {
                if key[0] != Self::PREFIX {
                    return Err(CryptoError::invalid_key(format!(
                        "prefixed key must start with {:#04x}, got {:#04x}",
                        Self::PREFIX,
                        key[0]
                    )));
                }
                prefixed.copy_from_slice(key);
            },
            actual => {
                return Err(CryptoError::invalid_key(format!(
                    "public key must be {} or {} bytes, got {actual}",
                    Self::RAW_SIZE,
                    Self::SIZE
                )));
            },
        }

        Ok(Self(prefixed))
    }

    /// Prefixed encoding (65 bytes).
    pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
        &self.0
    }

    /// Raw encoding (64 bytes, no prefix).
    pub fn raw(&self) -> &[u8] {
        &self.0[1..]
    }

    /// Whether the encoded coordinates describe a point on secp256k1.
    pub fn is_on_curve(&self) -> bool {
        self.to_point().is_ok()
    }

    pub(crate) fn to_point(self) -> Result<k256::PublicKey, CryptoError> {
        k256::PublicKey::from_sec1_bytes(&self.0)
            .map_err(|_| CryptoError::InvalidRecipientPublicKey)
    }

    pub(crate) fn from_point(point: &k256::PublicKey) -> Self {
        let encoded = point.to_encoded_point(false);
        let mut prefixed = [0u8; Self::SIZE];
        prefixed.copy_from_slice(encoded.as_bytes());
        Self(prefixed)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// secp256k1 private scalar.
///
/// Zeroized on drop by the underlying `k256::SecretKey`. `Debug` output is
/// redacted.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Width of the big-endian scalar encoding
    pub const SIZE: usize = 32;

    /// Parse a 32-byte big-endian scalar.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if the input is not 32 bytes or the scalar is zero or
    ///   not below the curve order
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != Self::SIZE {
            return Err(CryptoError::invalid_key(format!(
                "private key must be {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }

        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| CryptoError::invalid_key("private key scalar out of range"))
    }

    /// Generate a private key from the given entropy source.
    ///
    /// # Errors
    ///
    /// - `KeyGenerationFailed` if the source never yields an in-range scalar
    pub fn generate<E: Entropy>(entropy: &E) -> Result<Self, CryptoError> {
        generate_secret(entropy).map(Self)
    }

    /// Matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_point(&self.0.public_key())
    }

    /// Big-endian scalar bytes, zeroized when dropped.
    pub fn to_bytes(&self) -> Zeroizing<[u8; Self::SIZE]> {
        let mut field_bytes = self.0.to_bytes();
        let mut out = Zeroizing::new([0u8; Self::SIZE]);
        out.copy_from_slice(&field_bytes);
        field_bytes.as_mut_slice().zeroize();
        out
    }

    pub(crate) fn secret(&self) -> &SecretKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A private key together with its public key.
#[derive(Debug, Clone)]
pub struct KeyPair {
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair.
    pub fn generate<E: Entropy>(entropy: &E) -> Result<Self, CryptoError> {
        PrivateKey::generate(entropy).map(Self::from)
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Public half (prefixed encoding).
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl From<PrivateKey> for KeyPair {
    fn from(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self { private_key, public_key }
    }
}

/// Draw candidates until one is a valid non-zero scalar below the order.
pub(crate) fn generate_secret<E: Entropy>(entropy: &E) -> Result<SecretKey, CryptoError> {
    let mut candidate = Zeroizing::new([0u8; PrivateKey::SIZE]);

    for _ in 0..MAX_KEYGEN_ATTEMPTS {
        entropy.fill_bytes(candidate.as_mut_slice());
        if let Ok(secret) = SecretKey::from_slice(candidate.as_slice()) {
            return Ok(secret);
        }
    }

    tracing::warn!(attempts = MAX_KEYGEN_ATTEMPTS, "entropy source produced no valid scalar");
    Err(CryptoError::KeyGenerationFailed { attempts: MAX_KEYGEN_ATTEMPTS })
}
