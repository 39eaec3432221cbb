//! Owning handle around a validated keyset

use crate::{
    KeyId, Keyset, KeysetInfo, KeysetManager, KeyTemplate, PrimitiveKind, PrimitiveSet, Registry,
    Result,
};
use std::fmt;
use std::sync::Arc;

/// Immutable, shareable owner of a keyset.
///
/// The handle exposes metadata through [`KeysetHandle::keyset_info`] but never
/// the key material itself.
#[derive(Clone)]
pub struct KeysetHandle {
    keyset: Arc<Keyset>,
}

impl KeysetHandle {
    /// Generate a single-key keyset from a template using the global registry.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedAlgorithm` if the template's algorithm is not
    /// registered, or the key manager's error if generation fails.
    pub fn generate_new(template: &KeyTemplate) -> Result<Self> {
        Self::generate_new_in(Registry::global(), template)
    }

    /// Generate a single-key keyset from a template using `registry`.
    ///
    /// # Errors
    ///
    /// See [`KeysetHandle::generate_new`].
    pub fn generate_new_in(registry: &Registry, template: &KeyTemplate) -> Result<Self> {
        let mut manager = KeysetManager::new();
        manager.rotate_in(registry, template)?;
        manager.handle()
    }

    /// Adopt an existing keyset after validating it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the keyset is empty, has duplicate ids, or
    /// lacks an enabled primary key.
    pub fn from_keyset(keyset: Keyset) -> Result<Self> {
        keyset.validate()?;
        Ok(Self {
            keyset: Arc::new(keyset),
        })
    }

    /// Id of the primary key
    #[must_use]
    pub fn primary_key_id(&self) -> KeyId {
        self.keyset.primary_key_id()
    }

    /// Metadata of every key, without material
    #[must_use]
    pub fn keyset_info(&self) -> KeysetInfo {
        self.keyset.info()
    }

    /// Resolve the keyset into a primitive set using the global registry.
    ///
    /// # Errors
    ///
    /// See [`PrimitiveSet::build`].
    pub fn primitive_set<K: PrimitiveKind>(&self) -> Result<PrimitiveSet<K>> {
        PrimitiveSet::build(self, Registry::global())
    }

    /// Get a primitive of kind `K` through the wrapper registered globally.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no wrapper is registered for `K`, or any error of
    /// [`PrimitiveSet::build`].
    pub fn primitive<K: PrimitiveKind>(&self) -> Result<K::Instance> {
        self.primitive_in::<K>(Registry::global())
    }

    /// Get a primitive of kind `K` through the wrapper registered in `registry`.
    ///
    /// # Errors
    ///
    /// See [`KeysetHandle::primitive`].
    pub fn primitive_in<K: PrimitiveKind>(&self, registry: &Registry) -> Result<K::Instance> {
        let primitives = PrimitiveSet::<K>::build(self, registry)?;
        registry.wrap(primitives, None)
    }

    pub(crate) fn keyset(&self) -> &Keyset {
        &self.keyset
    }
}

impl fmt::Debug for KeysetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysetHandle")
            .field("info", &self.keyset.info())
            .finish()
    }
}
