//! Keyset mutation: adding, rotating, enabling and disabling keys

use crate::{
    Key, KeyId, KeyStatus, Keyset, KeysetHandle, KeyTemplate, Registry, Result, TesselError,
};
use rand::Rng;
use tracing::debug;

/// Mutable builder over a keyset.
///
/// Every change is checked against the keyset invariants when
/// [`KeysetManager::handle`] produces a new handle; operations that would
/// leave the primary unusable fail immediately.
#[derive(Debug, Default, Clone)]
pub struct KeysetManager {
    keys: Vec<Key>,
    primary_key_id: Option<KeyId>,
}

impl KeysetManager {
    /// Start from an empty keyset
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a copy of the keyset behind `handle`
    #[must_use]
    pub fn from_handle(handle: &KeysetHandle) -> Self {
        let keyset = handle.keyset();
        Self {
            keys: keyset.keys().to_vec(),
            primary_key_id: Some(keyset.primary_key_id()),
        }
    }

    /// Add an enabled, non-primary key generated from `template` with the
    /// global registry. Returns the new key id.
    ///
    /// # Errors
    ///
    /// See [`Registry::new_key`].
    pub fn add(&mut self, template: &KeyTemplate) -> Result<KeyId> {
        self.add_in(Registry::global(), template)
    }

    /// Add an enabled, non-primary key generated with `registry`.
    ///
    /// # Errors
    ///
    /// See [`Registry::new_key`].
    pub fn add_in(&mut self, registry: &Registry, template: &KeyTemplate) -> Result<KeyId> {
        let key_data = registry.new_key(template)?;
        let key_id = self.unused_key_id();
        self.keys.push(Key::new(
            key_id,
            KeyStatus::Enabled,
            template.output_prefix(),
            key_data,
        ));
        debug!(key_id, algorithm = template.algorithm_id(), "Added key to keyset");
        Ok(key_id)
    }

    /// Add a key from `template` with the global registry and make it primary
    ///
    /// # Errors
    ///
    /// See [`Registry::new_key`].
    pub fn rotate(&mut self, template: &KeyTemplate) -> Result<KeyId> {
        self.rotate_in(Registry::global(), template)
    }

    /// Add a key from `template` with `registry` and make it primary
    ///
    /// # Errors
    ///
    /// See [`Registry::new_key`].
    pub fn rotate_in(&mut self, registry: &Registry, template: &KeyTemplate) -> Result<KeyId> {
        let key_id = self.add_in(registry, template)?;
        self.primary_key_id = Some(key_id);
        Ok(key_id)
    }

    /// Make an enabled key the primary
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the key does not exist or is not enabled.
    pub fn set_primary(&mut self, key_id: KeyId) -> Result<&mut Self> {
        let key = self.key_mut(key_id)?;
        if key.status() != KeyStatus::Enabled {
            return Err(TesselError::invalid_keyset(format!(
                "key {key_id} must be enabled to become primary"
            )));
        }
        self.primary_key_id = Some(key_id);
        Ok(self)
    }

    /// Enable a disabled key
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the key does not exist or was destroyed.
    pub fn enable(&mut self, key_id: KeyId) -> Result<&mut Self> {
        let key = self.key_mut(key_id)?;
        if key.status() == KeyStatus::Destroyed {
            return Err(TesselError::invalid_keyset(format!(
                "key {key_id} was destroyed and cannot be enabled"
            )));
        }
        key.set_status(KeyStatus::Enabled);
        Ok(self)
    }

    /// Disable a key; it stops taking part in encryption and decryption
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the key does not exist, is primary, or was
    /// destroyed.
    pub fn disable(&mut self, key_id: KeyId) -> Result<&mut Self> {
        self.ensure_not_primary(key_id, "disable")?;
        let key = self.key_mut(key_id)?;
        if key.status() == KeyStatus::Destroyed {
            return Err(TesselError::invalid_keyset(format!(
                "key {key_id} was destroyed"
            )));
        }
        key.set_status(KeyStatus::Disabled);
        Ok(self)
    }

    /// Remove a key from the keyset
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the key does not exist or is primary.
    pub fn delete(&mut self, key_id: KeyId) -> Result<&mut Self> {
        self.ensure_not_primary(key_id, "delete")?;
        self.key_mut(key_id)?;
        self.keys.retain(|key| key.key_id() != key_id);
        Ok(self)
    }

    /// Wipe a key's material, keeping its id and algorithm in the keyset
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if the key does not exist or is primary.
    pub fn destroy(&mut self, key_id: KeyId) -> Result<&mut Self> {
        self.ensure_not_primary(key_id, "destroy")?;
        self.key_mut(key_id)?.destroy();
        Ok(self)
    }

    /// Produce a handle for the current keyset
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if no primary was set or the keyset breaks an
    /// invariant.
    pub fn handle(&self) -> Result<KeysetHandle> {
        let primary_key_id = self
            .primary_key_id
            .ok_or_else(|| TesselError::invalid_keyset("keyset has no primary key"))?;
        KeysetHandle::from_keyset(Keyset::new(self.keys.clone(), primary_key_id))
    }

    fn key_mut(&mut self, key_id: KeyId) -> Result<&mut Key> {
        self.keys
            .iter_mut()
            .find(|key| key.key_id() == key_id)
            .ok_or_else(|| TesselError::invalid_keyset(format!("key {key_id} not found")))
    }

    fn ensure_not_primary(&self, key_id: KeyId, operation: &str) -> Result<()> {
        if self.primary_key_id == Some(key_id) {
            return Err(TesselError::invalid_keyset(format!(
                "cannot {operation} the primary key {key_id}"
            )));
        }
        Ok(())
    }

    fn unused_key_id(&self) -> KeyId {
        let mut rng = rand::rng();
        loop {
            let candidate: KeyId = rng.random();
            if candidate != 0 && self.keys.iter().all(|key| key.key_id() != candidate) {
                return candidate;
            }
        }
    }
}
