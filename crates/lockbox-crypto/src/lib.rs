//! Lockbox Cryptographic Primitives
//!
//! Building blocks for the Lockbox ECIES engine: secp256k1 key handling, ECDH
//! key agreement, `XChaCha20-Poly1305` AEAD and deterministic ECDSA. Wire
//! formats live in `lockbox-proto`; this crate only deals in keys, secrets and
//! detached AEAD envelopes.
//!
//! # Key Lifecycle
//!
//! ```text
//! Entropy
//!    │
//!    ▼
//! Ephemeral Key Pair (one per message, per recipient)
//!    │
//!    ▼ ECDH with recipient public key
//! Shared Secret (x-coordinate)
//!    │
//!    ▼ leading 32 bytes
//! Symmetric Key
//!    │
//!    ▼
//! XChaCha20-Poly1305 → nonce, tag, ciphertext
//! ```
//!
//! The ephemeral secret is consumed by the agreement and never leaves this
//! crate. Shared secrets and symmetric keys zeroize on drop.
//!
//! # Security
//!
//! Key Validation:
//! - [`PublicKey::normalize`] is the single format check for public keys
//! - Curve membership is checked before every agreement or verification
//!
//! Authenticity:
//! - Any tag mismatch yields [`CryptoError::DecryptionFailed`], nothing else
//! - Signature verification is a boolean, never an error
//!
//! Randomness:
//! - All randomness flows through [`Entropy`]; production uses [`OsEntropy`]

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod entropy;
pub mod error;
pub mod keys;
pub mod primitives;
pub mod signature;

#[cfg(any(test, feature = "test-utils"))]
pub use entropy::SeededEntropy;
pub use entropy::{Entropy, OsEntropy};
pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use primitives::{
    AeadEnvelope, CryptoCore, EphemeralKeyPair, NONCE_SIZE, SYMMETRIC_KEY_SIZE, SharedSecret,
    SymmetricKey, TAG_SIZE,
};
pub use signature::{Signature, sign, verify};
