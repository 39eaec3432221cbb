//! Keyset-level deterministic AEAD behaviour through both entry points

#![cfg(feature = "aes-siv")]
#![allow(deprecated)]

use hex_literal::hex;
use proptest::prelude::*;
use std::sync::Arc;
use tessel_core::{
    Key, KeyData, KeyMaterial, KeyStatus, KeyTemplates, Keyset, KeysetHandle, KeysetManager,
    OutputPrefixType, Registry, TesselError, STANDARD_PREFIX_SIZE,
};
use tessel_daead::{
    AesSivKeyManager, DeterministicAead, DeterministicAeadConfig, DeterministicAeadFactory,
    DeterministicAeadKind, AES_SIV_ALGORITHM_ID,
};

const KEY_A: [u8; 64] = hex!(
    "8d0a1d4c7f6b3e2a91c5d8e7f60a1b2c3d4e5f60718293a4b5c6d7e8f9000112"
    "233445566778899aabbccddeeff00112233445566778899aabbccddeeff00112"
);
const KEY_B: [u8; 64] = hex!(
    "fedcba98765432100123456789abcdeffedcba98765432100123456789abcdef"
    "0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796a5b4c3d2e1f0"
);

fn setup() {
    DeterministicAeadConfig::register().unwrap();
}

fn daead(handle: &KeysetHandle) -> Arc<dyn DeterministicAead> {
    handle.primitive::<DeterministicAeadKind>().unwrap()
}

fn fixed_key(id: u32, status: KeyStatus, prefix: OutputPrefixType, material: &[u8]) -> Key {
    Key::new(
        id,
        status,
        prefix,
        KeyData::new(AES_SIV_ALGORITHM_ID, KeyMaterial::from_slice(material)),
    )
}

#[test]
fn round_trip_through_generated_keyset() {
    setup();
    let handle = KeysetHandle::generate_new(&KeyTemplates::get("AES256_SIV").unwrap()).unwrap();
    let daead = daead(&handle);

    let ciphertext = daead.encrypt_deterministically(b"plaintext", b"ad").unwrap();
    assert_eq!(
        &ciphertext[..STANDARD_PREFIX_SIZE],
        OutputPrefixType::Standard
            .prefix_for(handle.primary_key_id())
            .as_slice()
    );
    assert_eq!(
        daead.decrypt_deterministically(&ciphertext, b"ad").unwrap(),
        b"plaintext"
    );
}

#[test]
fn empty_plaintext_and_associated_data_round_trip() {
    setup();
    let handle = KeysetHandle::generate_new(&KeyTemplates::get("AES256_SIV_RAW").unwrap()).unwrap();
    let daead = daead(&handle);
    let ciphertext = daead.encrypt_deterministically(b"", b"").unwrap();
    assert_eq!(ciphertext.len(), 16);
    assert!(daead.decrypt_deterministically(&ciphertext, b"").unwrap().is_empty());
}

#[test]
fn encryption_is_deterministic_across_independent_handles() {
    setup();
    let keyset = || {
        Keyset::new(
            vec![fixed_key(42, KeyStatus::Enabled, OutputPrefixType::Standard, &KEY_A)],
            42,
        )
    };
    let first = daead(&KeysetHandle::from_keyset(keyset()).unwrap());

    // A separate registry stands in for another process
    let registry = Registry::new();
    DeterministicAeadConfig::register_in(&registry).unwrap();
    let second = KeysetHandle::from_keyset(keyset())
        .unwrap()
        .primitive_in::<DeterministicAeadKind>(&registry)
        .unwrap();

    let a = first.encrypt_deterministically(b"message", b"context").unwrap();
    let b = first.encrypt_deterministically(b"message", b"context").unwrap();
    let c = second.encrypt_deterministically(b"message", b"context").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(&a[..STANDARD_PREFIX_SIZE], &hex!("010000002a"));
}

#[test]
fn wrong_associated_data_is_an_opaque_failure() {
    setup();
    let handle = KeysetHandle::generate_new(&AesSivKeyManager::aes256_siv_template()).unwrap();
    let daead = daead(&handle);
    let ciphertext = daead.encrypt_deterministically(b"secret", b"right").unwrap();

    let err = daead
        .decrypt_deterministically(&ciphertext, b"wrong")
        .unwrap_err();
    assert_eq!(err, TesselError::DecryptionFailed);
    assert_eq!(err.to_string(), "Decryption failed");
}

#[test]
fn tampered_ciphertext_fails() {
    setup();
    let handle = KeysetHandle::generate_new(&AesSivKeyManager::aes256_siv_template()).unwrap();
    let daead = daead(&handle);
    let mut ciphertext = daead.encrypt_deterministically(b"secret", b"ad").unwrap();
    let last = ciphertext.len() - 1;
    ciphertext[last] ^= 0x01;
    assert_eq!(
        daead.decrypt_deterministically(&ciphertext, b"ad"),
        Err(TesselError::DecryptionFailed)
    );
    assert_eq!(
        daead.decrypt_deterministically(b"", b"ad"),
        Err(TesselError::DecryptionFailed)
    );
}

#[test]
fn rotated_keyset_decrypts_old_ciphertexts_and_encrypts_with_new_primary() {
    setup();
    let template = AesSivKeyManager::aes256_siv_template();
    let before = KeysetHandle::generate_new(&template).unwrap();
    let old_ciphertext = daead(&before)
        .encrypt_deterministically(b"payload", b"ad")
        .unwrap();

    let mut manager = KeysetManager::from_handle(&before);
    let new_primary = manager.rotate(&template).unwrap();
    let after = manager.handle().unwrap();
    let rotated = daead(&after);

    assert_eq!(
        rotated.decrypt_deterministically(&old_ciphertext, b"ad").unwrap(),
        b"payload"
    );
    let new_ciphertext = rotated.encrypt_deterministically(b"payload", b"ad").unwrap();
    assert_eq!(
        &new_ciphertext[..STANDARD_PREFIX_SIZE],
        OutputPrefixType::Standard.prefix_for(new_primary).as_slice()
    );
    assert_ne!(new_ciphertext, old_ciphertext);

    // The pre-rotation keyset does not know the new key
    assert_eq!(
        daead(&before).decrypt_deterministically(&new_ciphertext, b"ad"),
        Err(TesselError::DecryptionFailed)
    );
}

#[test]
fn disabled_key_no_longer_decrypts() {
    setup();
    let template = AesSivKeyManager::aes256_siv_template();
    let mut manager = KeysetManager::new();
    let old = manager.rotate(&template).unwrap();
    let old_ciphertext = daead(&manager.handle().unwrap())
        .encrypt_deterministically(b"payload", b"ad")
        .unwrap();

    manager.rotate(&template).unwrap();
    manager.disable(old).unwrap();
    let disabled = manager.handle().unwrap();
    assert_eq!(
        daead(&disabled).decrypt_deterministically(&old_ciphertext, b"ad"),
        Err(TesselError::DecryptionFailed)
    );

    manager.enable(old).unwrap();
    let enabled = manager.handle().unwrap();
    assert_eq!(
        daead(&enabled)
            .decrypt_deterministically(&old_ciphertext, b"ad")
            .unwrap(),
        b"payload"
    );
}

#[test]
fn raw_and_standard_keys_interoperate() {
    setup();
    let raw_only = KeysetHandle::from_keyset(Keyset::new(
        vec![fixed_key(1, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_A)],
        1,
    ))
    .unwrap();
    let raw_ciphertext = daead(&raw_only)
        .encrypt_deterministically(b"legacy", b"ad")
        .unwrap();
    assert_eq!(raw_ciphertext.len(), 16 + 6);

    let mixed = KeysetHandle::from_keyset(Keyset::new(
        vec![
            fixed_key(1, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_A),
            fixed_key(2, KeyStatus::Enabled, OutputPrefixType::Standard, &KEY_B),
        ],
        2,
    ))
    .unwrap();
    let mixed = daead(&mixed);
    assert_eq!(
        mixed.decrypt_deterministically(&raw_ciphertext, b"ad").unwrap(),
        b"legacy"
    );
    let standard_ciphertext = mixed.encrypt_deterministically(b"fresh", b"ad").unwrap();
    assert_eq!(&standard_ciphertext[..STANDARD_PREFIX_SIZE], &hex!("0100000002"));
    assert_eq!(
        mixed.decrypt_deterministically(&standard_ciphertext, b"ad").unwrap(),
        b"fresh"
    );
}

#[test]
fn keys_sharing_a_prefix_are_tried_in_order() {
    setup();
    let old = KeysetHandle::from_keyset(Keyset::new(
        vec![fixed_key(1, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_B)],
        1,
    ))
    .unwrap();
    let ciphertext = daead(&old).encrypt_deterministically(b"x", b"ad").unwrap();

    // KEY_A comes first and fails authentication; KEY_B must still be tried
    let both = KeysetHandle::from_keyset(Keyset::new(
        vec![
            fixed_key(7, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_A),
            fixed_key(8, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_B),
        ],
        7,
    ))
    .unwrap();
    assert_eq!(
        daead(&both).decrypt_deterministically(&ciphertext, b"ad").unwrap(),
        b"x"
    );
}

#[test]
fn wrapper_and_legacy_paths_agree() {
    setup();
    let mut manager = KeysetManager::new();
    manager
        .add(&AesSivKeyManager::raw_aes256_siv_template())
        .unwrap();
    manager
        .rotate(&AesSivKeyManager::aes256_siv_template())
        .unwrap();
    let handle = manager.handle().unwrap();

    let modern = daead(&handle);
    let legacy = DeterministicAeadFactory::get_primitive(&handle).unwrap();

    let from_modern = modern.encrypt_deterministically(b"same", b"ad").unwrap();
    let from_legacy = legacy.encrypt_deterministically(b"same", b"ad").unwrap();
    assert_eq!(from_modern, from_legacy);
    assert_eq!(
        legacy.decrypt_deterministically(&from_modern, b"ad").unwrap(),
        b"same"
    );
    assert_eq!(
        modern.decrypt_deterministically(&from_legacy, b"ad").unwrap(),
        b"same"
    );
}

#[test]
fn invalid_keysets_are_rejected_before_any_primitive_exists() {
    setup();
    assert!(matches!(
        KeysetHandle::from_keyset(Keyset::new(Vec::new(), 1)),
        Err(TesselError::InvalidKeyset(_))
    ));
    assert!(matches!(
        KeysetHandle::from_keyset(Keyset::new(
            vec![fixed_key(1, KeyStatus::Disabled, OutputPrefixType::Raw, &KEY_A)],
            1
        )),
        Err(TesselError::InvalidKeyset(_))
    ));
}

#[test]
fn malformed_key_material_is_an_invalid_key() {
    setup();
    let handle = KeysetHandle::from_keyset(Keyset::new(
        vec![fixed_key(1, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_A[..32])],
        1,
    ))
    .unwrap();
    assert!(matches!(
        handle.primitive::<DeterministicAeadKind>(),
        Err(TesselError::InvalidKey(_))
    ));
    assert!(matches!(
        DeterministicAeadFactory::get_primitive(&handle),
        Err(TesselError::InvalidKey(_))
    ));
}

#[test]
fn primitive_is_shareable_across_threads() {
    setup();
    let handle = KeysetHandle::generate_new(&AesSivKeyManager::aes256_siv_template()).unwrap();
    let daead = daead(&handle);
    let expected = daead.encrypt_deterministically(b"shared", b"ad").unwrap();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let daead = Arc::clone(&daead);
            let expected = expected.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    assert_eq!(
                        daead.encrypt_deterministically(b"shared", b"ad").unwrap(),
                        expected
                    );
                }
            });
        }
    });
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn decrypt_inverts_encrypt(
        plaintext in proptest::collection::vec(any::<u8>(), 0..256),
        associated_data in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        setup();
        let handle = KeysetHandle::from_keyset(Keyset::new(
            vec![
                fixed_key(3, KeyStatus::Enabled, OutputPrefixType::Raw, &KEY_B),
                fixed_key(4, KeyStatus::Enabled, OutputPrefixType::Standard, &KEY_A),
            ],
            4,
        ))
        .unwrap();
        let daead = daead(&handle);
        let ciphertext = daead.encrypt_deterministically(&plaintext, &associated_data).unwrap();
        prop_assert_eq!(
            &ciphertext,
            &daead.encrypt_deterministically(&plaintext, &associated_data).unwrap()
        );
        prop_assert_eq!(
            daead.decrypt_deterministically(&ciphertext, &associated_data).unwrap(),
            plaintext
        );
    }
}
