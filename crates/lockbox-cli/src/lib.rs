//! Lockbox command-line operations.
//!
//! The binary in `main.rs` only parses arguments and moves bytes between
//! files; everything else lives here so it can be exercised without a
//! process boundary.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod keyfile;

use lockbox_crypto::{Entropy, KeyPair, PrivateKey, PublicKey};
use lockbox_proto::{EncryptionMode, Lockbox, Recipient};

pub use error::{CliError, Result};

/// Generate a fresh key pair.
pub fn keygen<E: Entropy>(lockbox: &Lockbox<E>) -> Result<KeyPair> {
    let key_pair = lockbox.generate_key_pair()?;
    tracing::info!(public_key = %key_pair.public_key(), "generated key pair");
    Ok(key_pair)
}

/// Encrypt `plaintext` into a typed envelope.
///
/// One recipient produces a single-recipient message in `mode`; several
/// produce a multi-recipient message with identifiers derived from each key.
pub fn encrypt<E: Entropy>(
    lockbox: &Lockbox<E>,
    recipients: &[PublicKey],
    mode: EncryptionMode,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let sealed = match recipients {
        [recipient] => lockbox.seal(recipient.as_bytes(), plaintext, mode)?,
        _ => {
            let recipients: Vec<Recipient> =
                recipients.iter().copied().map(Recipient::from_public_key).collect();
            lockbox.seal_multiple(&recipients, plaintext)?
        },
    };

    tracing::info!(
        recipients = recipients.len(),
        plaintext_len = plaintext.len(),
        sealed_len = sealed.len(),
        "encrypted"
    );
    Ok(sealed)
}

/// Open a typed envelope with `private_key`.
pub fn decrypt<E: Entropy>(
    lockbox: &Lockbox<E>,
    private_key: &PrivateKey,
    sealed: &[u8],
) -> Result<Vec<u8>> {
    let plaintext = lockbox.open(private_key, sealed)?;
    tracing::info!(plaintext_len = plaintext.len(), "decrypted");
    Ok(plaintext)
}

/// Encrypt `plaintext` for one recipient as a stream of `block_size`-byte
/// single-mode blocks.
pub fn encrypt_stream<E: Entropy>(
    lockbox: &Lockbox<E>,
    recipient: &PublicKey,
    plaintext: &[u8],
    block_size: usize,
) -> Result<Vec<u8>> {
    let sealed = lockbox.encrypt_stream(recipient.as_bytes(), plaintext, block_size)?;
    tracing::info!(
        block_size,
        plaintext_len = plaintext.len(),
        sealed_len = sealed.len(),
        "encrypted stream"
    );
    Ok(sealed)
}

/// Decrypt a block stream produced by [`encrypt_stream`].
pub fn decrypt_stream<E: Entropy>(
    lockbox: &Lockbox<E>,
    private_key: &PrivateKey,
    sealed: &[u8],
    block_size: usize,
) -> Result<Vec<u8>> {
    let plaintext = lockbox.decrypt_stream(private_key, sealed, block_size)?;
    tracing::info!(plaintext_len = plaintext.len(), "decrypted stream");
    Ok(plaintext)
}

/// Hex-encoded signature over `message`.
pub fn sign<E: Entropy>(lockbox: &Lockbox<E>, private_key: &PrivateKey, message: &[u8]) -> String {
    hex::encode(lockbox.sign(private_key, message).as_bytes())
}

/// Check a hex-encoded signature.
///
/// # Errors
///
/// - `Hex` if `signature_hex` is not hex
/// - `VerificationFailed` if the signature does not match
pub fn verify<E: Entropy>(
    lockbox: &Lockbox<E>,
    public_key: &PublicKey,
    message: &[u8],
    signature_hex: &str,
) -> Result<()> {
    let signature = hex::decode(signature_hex.trim())
        .map_err(|source| CliError::Hex { what: "signature", source })?;

    if lockbox.verify(public_key.as_bytes(), message, &signature) {
        Ok(())
    } else {
        tracing::warn!(public_key = %public_key, "signature rejected");
        Err(CliError::VerificationFailed)
    }
}
