//! End-to-end flows through the CLI operations and key files

use lockbox_cli::{
    CliError, decrypt, decrypt_stream, encrypt, encrypt_stream, keyfile, keygen, sign, verify,
};
use lockbox_crypto::{CryptoCore, SeededEntropy};
use lockbox_proto::{
    DEFAULT_BLOCK_SIZE, EncryptionMode, EncryptionType, LengthCalculator, Limits, Lockbox,
    ProtocolError,
};

fn lockbox(seed: u64) -> Lockbox<SeededEntropy> {
    Lockbox::new(CryptoCore::new(SeededEntropy::from_seed(seed)), Limits::default())
}

#[test]
fn encrypt_to_key_files_and_decrypt() {
    let dir = tempfile::tempdir().unwrap();
    let lockbox = lockbox(1);

    let key_pair = keygen(&lockbox).unwrap();
    let (private_path, public_path) =
        keyfile::write_key_pair(&dir.path().join("alice"), &key_pair).unwrap();

    let public_key = keyfile::read_public_key(public_path.to_str().unwrap()).unwrap();
    let sealed = encrypt(&lockbox, &[public_key], EncryptionMode::Simple, b"notes").unwrap();
    assert_eq!(sealed[0], EncryptionType::Simple.to_byte());

    let private_key = keyfile::read_private_key(&private_path).unwrap();
    assert_eq!(decrypt(&lockbox, &private_key, &sealed).unwrap(), b"notes");
}

#[test]
fn several_recipients_use_multi_format() {
    let lockbox = lockbox(2);
    let alice = keygen(&lockbox).unwrap();
    let bob = keygen(&lockbox).unwrap();
    let carol = keygen(&lockbox).unwrap();

    let sealed = encrypt(
        &lockbox,
        &[*alice.public_key(), *bob.public_key()],
        EncryptionMode::Single,
        b"shared",
    )
    .unwrap();
    assert_eq!(sealed[0], EncryptionType::Multiple.to_byte());

    assert_eq!(decrypt(&lockbox, alice.private_key(), &sealed).unwrap(), b"shared");
    assert_eq!(decrypt(&lockbox, bob.private_key(), &sealed).unwrap(), b"shared");
    assert!(matches!(
        decrypt(&lockbox, carol.private_key(), &sealed),
        Err(CliError::Protocol(ProtocolError::RecipientNotFound))
    ));
}

#[test]
fn recipient_limit_applies() {
    let limits = Limits { max_recipients: 1, ..Limits::default() };
    let lockbox = Lockbox::new(CryptoCore::new(SeededEntropy::from_seed(3)), limits);
    let a = keygen(&lockbox).unwrap();
    let b = keygen(&lockbox).unwrap();

    let result =
        encrypt(&lockbox, &[*a.public_key(), *b.public_key()], EncryptionMode::Single, b"x");
    assert!(matches!(
        result,
        Err(CliError::Protocol(ProtocolError::TooManyRecipients { count: 2, max: 1 }))
    ));
}

#[test]
fn stream_round_trip_with_default_blocks() {
    let lockbox = lockbox(5);
    let key_pair = keygen(&lockbox).unwrap();
    let capacity = DEFAULT_BLOCK_SIZE - EncryptionMode::Single.overhead();
    let plaintext = vec![0x5A; capacity * 2 + 17];

    let sealed =
        encrypt_stream(&lockbox, key_pair.public_key(), &plaintext, DEFAULT_BLOCK_SIZE).unwrap();
    let tail = LengthCalculator::for_mode(EncryptionMode::Single).encrypted_length(17).unwrap();
    assert_eq!(sealed.len(), 2 * DEFAULT_BLOCK_SIZE + tail);

    let opened =
        decrypt_stream(&lockbox, key_pair.private_key(), &sealed, DEFAULT_BLOCK_SIZE).unwrap();
    assert_eq!(opened, plaintext);
}

#[test]
fn sign_then_verify() {
    let lockbox = lockbox(4);
    let key_pair = keygen(&lockbox).unwrap();

    let signature = sign(&lockbox, key_pair.private_key(), b"document");
    assert_eq!(signature.len(), 128);

    verify(&lockbox, key_pair.public_key(), b"document", &format!("{signature}\n")).unwrap();
    assert!(matches!(
        verify(&lockbox, key_pair.public_key(), b"tampered", &signature),
        Err(CliError::VerificationFailed)
    ));
    assert!(matches!(
        verify(&lockbox, key_pair.public_key(), b"document", "zz"),
        Err(CliError::Hex { .. })
    ));
}
