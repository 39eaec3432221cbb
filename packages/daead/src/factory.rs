//! Legacy entry point that works without a registered wrapper

use crate::{DeterministicAead, DeterministicAeadKind, DeterministicAeadWrapper};
use std::sync::Arc;
use tessel_core::{KeysetHandle, PrimitiveSet, PrimitiveWrapper, Registry, Result};

/// Builds deterministic AEAD primitives straight from a keyset handle.
///
/// Unlike [`KeysetHandle::primitive`], this never consults the registered
/// wrappers, so it keeps working when only key managers are registered.
pub struct DeterministicAeadFactory;

impl DeterministicAeadFactory {
    /// Primitive for `handle`, resolved with the global registry.
    ///
    /// # Errors
    ///
    /// Any error of [`PrimitiveSet::build`]; a missing wrapper is not one.
    #[deprecated(note = "use KeysetHandle::primitive::<DeterministicAeadKind>() instead")]
    pub fn get_primitive(handle: &KeysetHandle) -> Result<Arc<dyn DeterministicAead>> {
        Self::primitive_in(handle, Registry::global())
    }

    /// Primitive for `handle`, resolved with `registry`.
    ///
    /// # Errors
    ///
    /// Any error of [`PrimitiveSet::build`].
    pub fn primitive_in(
        handle: &KeysetHandle,
        registry: &Registry,
    ) -> Result<Arc<dyn DeterministicAead>> {
        let primitives = PrimitiveSet::<DeterministicAeadKind>::build(handle, registry)?;
        let wrapper: &dyn PrimitiveWrapper<Kind = DeterministicAeadKind> = &DeterministicAeadWrapper;
        registry.wrap(primitives, Some(wrapper))
    }
}

#[cfg(all(test, feature = "aes-siv"))]
mod tests {
    use super::*;
    use crate::AesSivKeyManager;

    #[test]
    fn works_with_only_the_key_manager_registered() {
        let registry = Registry::new();
        registry.register_key_manager(AesSivKeyManager, false).unwrap();
        let template = registry.key_template("AES256_SIV").unwrap();
        let handle = KeysetHandle::generate_new_in(&registry, &template).unwrap();

        let daead = DeterministicAeadFactory::primitive_in(&handle, &registry).unwrap();
        let ciphertext = daead.encrypt_deterministically(b"plaintext", b"ad").unwrap();
        assert_eq!(
            daead.decrypt_deterministically(&ciphertext, b"ad").unwrap(),
            b"plaintext"
        );
        assert!(!registry.has_wrapper::<DeterministicAeadKind>());
    }

    #[test]
    fn unknown_algorithm_still_fails() {
        let registry = Registry::new();
        let template = AesSivKeyManager::aes256_siv_template();
        assert!(KeysetHandle::generate_new_in(&registry, &template).is_err());
    }
}
