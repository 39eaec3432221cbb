//! Keyset-level deterministic AEAD: encrypt with the primary, decrypt with
//! whichever key matches

use crate::{DeterministicAead, DeterministicAeadKind};
use std::sync::Arc;
use tessel_core::{PrimitiveSet, PrimitiveWrapper, Registry, Result, TesselError};
use tracing::debug;

/// Deterministic AEAD over every enabled key of a keyset.
///
/// Ciphertexts are `prefix || raw_ciphertext` where the prefix identifies the
/// primary key (empty for raw keys).
pub struct WrappedDeterministicAead {
    primitives: PrimitiveSet<DeterministicAeadKind>,
}

impl WrappedDeterministicAead {
    /// Wrap a resolved primitive set
    #[must_use]
    pub fn new(primitives: PrimitiveSet<DeterministicAeadKind>) -> Self {
        Self { primitives }
    }
}

impl DeterministicAead for WrappedDeterministicAead {
    fn encrypt_deterministically(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let primary = self.primitives.primary();
        let raw = primary
            .primitive()
            .encrypt_deterministically(plaintext, associated_data)?;

        let prefix = primary.identifier();
        let mut ciphertext = Vec::with_capacity(prefix.len() + raw.len());
        ciphertext.extend_from_slice(prefix);
        ciphertext.extend_from_slice(&raw);
        Ok(ciphertext)
    }

    fn decrypt_deterministically(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        for (entry, payload) in self.primitives.decryption_candidates(ciphertext) {
            if let Ok(plaintext) = entry
                .primitive()
                .decrypt_deterministically(payload, associated_data)
            {
                return Ok(plaintext);
            }
        }
        debug!("No key in the keyset decrypted the ciphertext");
        Err(TesselError::DecryptionFailed)
    }
}

/// Wrapper turning a deterministic AEAD primitive set into one primitive
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicAeadWrapper;

impl DeterministicAeadWrapper {
    /// Register with the global registry; repeated calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if another wrapper type is registered for the kind.
    pub fn register() -> Result<()> {
        Registry::global().register_wrapper(DeterministicAeadWrapper, false)
    }
}

impl PrimitiveWrapper for DeterministicAeadWrapper {
    type Kind = DeterministicAeadKind;

    fn wrap(
        &self,
        primitives: PrimitiveSet<DeterministicAeadKind>,
    ) -> Result<Arc<dyn DeterministicAead>> {
        Ok(Arc::new(WrappedDeterministicAead::new(primitives)))
    }
}
