//! The deterministic AEAD primitive interface

use std::sync::Arc;
use tessel_core::{PrimitiveKind, Result};

/// Authenticated encryption without randomness: the same key, plaintext and
/// associated data always yield the same ciphertext.
pub trait DeterministicAead: Send + Sync {
    /// Encrypt `plaintext`, authenticating `associated_data` alongside it.
    ///
    /// # Errors
    ///
    /// Returns `EncryptionFailed` if the underlying cipher refuses the input.
    fn encrypt_deterministically(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` produced with the same `associated_data`.
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if authentication fails.
    fn decrypt_deterministically(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

/// Primitive kind marker for deterministic AEAD
pub struct DeterministicAeadKind;

impl PrimitiveKind for DeterministicAeadKind {
    type Instance = Arc<dyn DeterministicAead>;
    const NAME: &'static str = "DeterministicAead";
}
