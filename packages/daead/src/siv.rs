//! AES-SIV (RFC 5297) with 512-bit keys

use crate::{DeterministicAead, DeterministicAeadKind};
use aes_siv::{siv::Aes256Siv, KeyInit};
use std::sync::Arc;
use tessel_core::{
    KeyManager, KeyMaterial, KeyParameters, KeyTemplate, OutputPrefixType, Registry, Result,
    TesselError,
};
use zeroize::Zeroizing;

/// Algorithm identifier of AES-SIV keys
pub const AES_SIV_ALGORITHM_ID: &str = "type.googleapis.com/google.crypto.tink.AesSivKey";

/// AES-SIV key size in bytes (two AES-256 keys: one for S2V, one for CTR)
pub const AES_SIV_KEY_SIZE: usize = 64;

/// Deterministic AEAD over AES-SIV-CMAC-512.
///
/// The associated data is the single S2V header. Output is `SIV || ciphertext`.
pub struct AesSiv {
    key: Zeroizing<Vec<u8>>,
}

impl AesSiv {
    /// Create the primitive from a 64-byte key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for any other key length.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != AES_SIV_KEY_SIZE {
            return Err(TesselError::invalid_key(format!(
                "invalid AES-SIV key size: {}, valid keys have {AES_SIV_KEY_SIZE} bytes",
                key.len()
            )));
        }
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    // `Aes256Siv` needs `&mut self`, so each call gets its own instance.
    // The key length was checked in `new`; the error arm is unreachable.
    fn cipher(&self) -> Result<Aes256Siv> {
        Aes256Siv::new_from_slice(&self.key)
            .map_err(|e| TesselError::invalid_key(format!("AES-SIV key rejected: {e}")))
    }
}

impl DeterministicAead for AesSiv {
    fn encrypt_deterministically(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.cipher()?
            .encrypt([associated_data], plaintext)
            .map_err(|_| TesselError::encryption_failed("AES-SIV encryption failed"))
    }

    fn decrypt_deterministically(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.cipher()?
            .decrypt([associated_data], ciphertext)
            .map_err(|_| TesselError::DecryptionFailed)
    }
}

/// Key manager for [`AesSiv`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AesSivKeyManager;

impl AesSivKeyManager {
    /// Register with the global registry.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if another manager holds the algorithm id, or if
    /// generation was previously registered as disallowed and is now allowed.
    pub fn register(new_key_allowed: bool) -> Result<()> {
        Registry::global().register_key_manager_with(AesSivKeyManager, new_key_allowed, false)
    }

    /// `AES256_SIV`: 64-byte key, standard output prefix
    #[must_use]
    pub fn aes256_siv_template() -> KeyTemplate {
        KeyTemplate::new(
            AES_SIV_ALGORITHM_ID,
            KeyParameters::with_key_size(AES_SIV_KEY_SIZE),
            OutputPrefixType::Standard,
        )
    }

    /// `AES256_SIV_RAW`: 64-byte key, no output prefix
    #[must_use]
    pub fn raw_aes256_siv_template() -> KeyTemplate {
        Self::aes256_siv_template().with_output_prefix(OutputPrefixType::Raw)
    }
}

impl KeyManager for AesSivKeyManager {
    type Kind = DeterministicAeadKind;

    fn algorithm_id(&self) -> &str {
        AES_SIV_ALGORITHM_ID
    }

    fn new_primitive(&self, material: &KeyMaterial) -> Result<Arc<dyn DeterministicAead>> {
        Ok(Arc::new(AesSiv::new(material.expose_secret())?))
    }

    fn validate_parameters(&self, parameters: &KeyParameters) -> Result<()> {
        if parameters.key_size != AES_SIV_KEY_SIZE {
            return Err(TesselError::invalid_key(format!(
                "invalid AES-SIV key size: {}, valid keys have {AES_SIV_KEY_SIZE} bytes",
                parameters.key_size
            )));
        }
        Ok(())
    }

    fn new_key(&self, parameters: &KeyParameters) -> Result<KeyMaterial> {
        self.validate_parameters(parameters)?;
        Ok(KeyMaterial::random(parameters.key_size))
    }

    fn named_templates(&self) -> Vec<(String, KeyTemplate)> {
        vec![
            ("AES256_SIV".to_string(), Self::aes256_siv_template()),
            ("AES256_SIV_RAW".to_string(), Self::raw_aes256_siv_template()),
        ]
    }
}
