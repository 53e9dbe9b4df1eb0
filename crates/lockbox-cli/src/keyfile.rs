//! Hex-encoded key files.
//!
//! A key pair is stored as two text files: `<stem>.key` holding the 32-byte
//! private scalar and `<stem>.pub` holding the 65-byte prefixed public key.

use std::{
    fs,
    path::{Path, PathBuf},
};

use lockbox_crypto::{KeyPair, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::error::{CliError, Result};

/// Paths of the private and public halves for `stem`.
pub fn key_paths(stem: &Path) -> (PathBuf, PathBuf) {
    (stem.with_extension("key"), stem.with_extension("pub"))
}

/// Write both halves of `key_pair` next to `stem`.
pub fn write_key_pair(stem: &Path, key_pair: &KeyPair) -> Result<(PathBuf, PathBuf)> {
    let (private_path, public_path) = key_paths(stem);

    let secret = Zeroizing::new(hex::encode(key_pair.private_key().to_bytes().as_slice()));
    fs::write(&private_path, secret.as_bytes()).map_err(CliError::io(&private_path))?;
    fs::write(&public_path, key_pair.public_key().to_string()).map_err(CliError::io(&public_path))?;

    Ok((private_path, public_path))
}

/// Load a private key file.
pub fn read_private_key(path: &Path) -> Result<PrivateKey> {
    let text = Zeroizing::new(fs::read_to_string(path).map_err(CliError::io(path))?);

    let mut bytes = Zeroizing::new([0u8; PrivateKey::SIZE]);
    hex::decode_to_slice(text.trim(), bytes.as_mut_slice())
        .map_err(|source| CliError::Hex { what: "private key", source })?;

    Ok(PrivateKey::from_bytes(bytes.as_slice())?)
}

/// Resolve a public key given either as a `.pub` file path or inline hex.
///
/// Both raw (64-byte) and prefixed (65-byte) encodings are accepted.
pub fn read_public_key(source: &str) -> Result<PublicKey> {
    let path = Path::new(source);
    let text = if path.is_file() {
        fs::read_to_string(path).map_err(CliError::io(path))?
    } else {
        source.to_owned()
    };

    let bytes = hex::decode(text.trim())
        .map_err(|source| CliError::Hex { what: "public key", source })?;
    Ok(PublicKey::normalize(&bytes)?)
}

#[cfg(test)]
mod tests {
    use lockbox_crypto::SeededEntropy;

    use super::*;

    #[test]
    fn key_pair_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("alice");
        let key_pair = KeyPair::generate(&SeededEntropy::from_seed(1)).unwrap();

        let (private_path, public_path) = write_key_pair(&stem, &key_pair).unwrap();

        let private_key = read_private_key(&private_path).unwrap();
        assert_eq!(private_key.public_key(), *key_pair.public_key());

        let public_key = read_public_key(public_path.to_str().unwrap()).unwrap();
        assert_eq!(public_key, *key_pair.public_key());
    }

    #[test]
    fn inline_raw_hex_is_accepted() {
        let key_pair = KeyPair::generate(&SeededEntropy::from_seed(2)).unwrap();
        let raw = hex::encode(key_pair.public_key().raw());

        assert_eq!(read_public_key(&raw).unwrap(), *key_pair.public_key());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(read_public_key("not hex"), Err(CliError::Hex { .. })));
        assert!(matches!(read_public_key("0404"), Err(CliError::Crypto(_))));
    }
}
