//! Keys, keysets and the metadata view exposed to callers

use crate::{KeyData, Result, TesselError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Numeric key identifier, unique within a keyset
pub type KeyId = u32;

/// First byte of every standard output prefix
pub const STANDARD_START_BYTE: u8 = 0x01;

/// Length of a standard output prefix: start byte plus big-endian key id
pub const STANDARD_PREFIX_SIZE: usize = 5;

/// Lifecycle state of a key inside a keyset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// Usable for encryption (if primary) and decryption
    Enabled,
    /// Kept in the keyset but excluded from every operation
    Disabled,
    /// Material wiped; can never be enabled again
    Destroyed,
}

/// How ciphertexts produced by a key announce which key made them
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPrefixType {
    /// No prefix; the ciphertext is the raw primitive output
    Raw,
    /// `0x01 || key_id` in big-endian order
    Standard,
}

impl OutputPrefixType {
    /// Prefix bytes a key with this style and id prepends to its output
    #[must_use]
    pub fn prefix_for(self, key_id: KeyId) -> Vec<u8> {
        match self {
            Self::Raw => Vec::new(),
            Self::Standard => {
                let mut prefix = Vec::with_capacity(STANDARD_PREFIX_SIZE);
                prefix.push(STANDARD_START_BYTE);
                prefix.extend_from_slice(&key_id.to_be_bytes());
                prefix
            }
        }
    }
}

/// One key of a keyset
#[derive(Clone, Debug)]
pub struct Key {
    key_id: KeyId,
    status: KeyStatus,
    output_prefix: OutputPrefixType,
    key_data: KeyData,
}

impl Key {
    /// Assemble a key from its parts
    #[must_use]
    pub fn new(
        key_id: KeyId,
        status: KeyStatus,
        output_prefix: OutputPrefixType,
        key_data: KeyData,
    ) -> Self {
        Self {
            key_id,
            status,
            output_prefix,
            key_data,
        }
    }

    /// Identifier of the key
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// Output prefix style
    #[must_use]
    pub fn output_prefix(&self) -> OutputPrefixType {
        self.output_prefix
    }

    /// Algorithm identifier of the key data
    #[must_use]
    pub fn algorithm_id(&self) -> &str {
        self.key_data.algorithm_id()
    }

    /// Bytes prepended to ciphertexts produced with this key
    #[must_use]
    pub fn output_prefix_bytes(&self) -> Vec<u8> {
        self.output_prefix.prefix_for(self.key_id)
    }

    pub(crate) fn key_data(&self) -> &KeyData {
        &self.key_data
    }

    pub(crate) fn set_status(&mut self, status: KeyStatus) {
        self.status = status;
    }

    pub(crate) fn destroy(&mut self) {
        self.key_data.wipe();
        self.status = KeyStatus::Destroyed;
    }

    fn info(&self) -> KeyInfo {
        KeyInfo {
            key_id: self.key_id,
            status: self.status,
            output_prefix: self.output_prefix,
            algorithm_id: self.algorithm_id().to_string(),
        }
    }
}

/// Ordered keys plus the id of the primary key
#[derive(Clone, Debug)]
pub struct Keyset {
    keys: Vec<Key>,
    primary_key_id: KeyId,
}

impl Keyset {
    /// Assemble a keyset. Call [`Keyset::validate`] (or hand it to
    /// `KeysetHandle::from_keyset`) before use.
    #[must_use]
    pub fn new(keys: Vec<Key>, primary_key_id: KeyId) -> Self {
        Self {
            keys,
            primary_key_id,
        }
    }

    /// Keys in keyset order
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Id of the key used for encryption
    #[must_use]
    pub fn primary_key_id(&self) -> KeyId {
        self.primary_key_id
    }

    /// Look up a key by id
    #[must_use]
    pub fn key(&self, key_id: KeyId) -> Option<&Key> {
        self.keys.iter().find(|key| key.key_id == key_id)
    }

    /// Check the structural invariants of the keyset.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyset` if:
    /// - the keyset has no keys or no enabled key
    /// - two keys share an id
    /// - an enabled key has no material
    /// - the primary id is missing or points at a key that is not enabled
    pub fn validate(&self) -> Result<()> {
        if self.keys.is_empty() {
            return Err(TesselError::invalid_keyset("keyset contains no keys"));
        }

        let mut seen = HashSet::with_capacity(self.keys.len());
        for key in &self.keys {
            if !seen.insert(key.key_id) {
                return Err(TesselError::invalid_keyset(format!(
                    "duplicate key id {}",
                    key.key_id
                )));
            }
            if key.status == KeyStatus::Enabled && key.key_data.material().is_empty() {
                return Err(TesselError::invalid_keyset(format!(
                    "enabled key {} has no key material",
                    key.key_id
                )));
            }
        }

        if !self.keys.iter().any(|key| key.status == KeyStatus::Enabled) {
            return Err(TesselError::invalid_keyset("keyset contains no enabled key"));
        }

        match self.key(self.primary_key_id) {
            None => Err(TesselError::invalid_keyset(format!(
                "primary key {} not found",
                self.primary_key_id
            ))),
            Some(primary) if primary.status != KeyStatus::Enabled => {
                Err(TesselError::invalid_keyset(format!(
                    "primary key {} is not enabled",
                    self.primary_key_id
                )))
            }
            Some(_) => Ok(()),
        }
    }

    /// Metadata view without any key material
    #[must_use]
    pub fn info(&self) -> KeysetInfo {
        KeysetInfo {
            primary_key_id: self.primary_key_id,
            keys: self.keys.iter().map(Key::info).collect(),
        }
    }
}

/// Public description of one key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Key identifier
    pub key_id: KeyId,
    /// Key status
    pub status: KeyStatus,
    /// Output prefix style
    pub output_prefix: OutputPrefixType,
    /// Algorithm identifier
    pub algorithm_id: String,
}

/// Public description of a keyset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetInfo {
    /// Id of the primary key
    pub primary_key_id: KeyId,
    /// Keys in keyset order
    pub keys: Vec<KeyInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyMaterial;

    fn key(id: KeyId, status: KeyStatus) -> Key {
        Key::new(
            id,
            status,
            OutputPrefixType::Standard,
            KeyData::new("toy", KeyMaterial::from_slice(&[7u8; 16])),
        )
    }

    #[test]
    fn standard_prefix_is_start_byte_and_big_endian_id() {
        assert_eq!(
            OutputPrefixType::Standard.prefix_for(0x0102_0304),
            vec![0x01, 0x01, 0x02, 0x03, 0x04]
        );
        assert!(OutputPrefixType::Raw.prefix_for(42).is_empty());
    }

    #[test]
    fn valid_keyset_passes() {
        let keyset = Keyset::new(vec![key(1, KeyStatus::Enabled), key(2, KeyStatus::Disabled)], 1);
        assert!(keyset.validate().is_ok());
    }

    #[test]
    fn empty_keyset_is_rejected() {
        let keyset = Keyset::new(Vec::new(), 1);
        assert!(matches!(keyset.validate(), Err(TesselError::InvalidKeyset(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let keyset = Keyset::new(vec![key(1, KeyStatus::Enabled), key(1, KeyStatus::Enabled)], 1);
        assert!(matches!(keyset.validate(), Err(TesselError::InvalidKeyset(_))));
    }

    #[test]
    fn disabled_or_missing_primary_is_rejected() {
        let disabled = Keyset::new(vec![key(1, KeyStatus::Enabled), key(2, KeyStatus::Disabled)], 2);
        assert!(matches!(disabled.validate(), Err(TesselError::InvalidKeyset(_))));

        let missing = Keyset::new(vec![key(1, KeyStatus::Enabled)], 9);
        assert!(matches!(missing.validate(), Err(TesselError::InvalidKeyset(_))));
    }

    #[test]
    fn all_disabled_is_rejected() {
        let keyset = Keyset::new(vec![key(1, KeyStatus::Disabled)], 1);
        assert!(matches!(keyset.validate(), Err(TesselError::InvalidKeyset(_))));
    }

    #[test]
    fn destroyed_key_keeps_algorithm_but_loses_material() {
        let mut k = key(3, KeyStatus::Enabled);
        k.destroy();
        assert_eq!(k.status(), KeyStatus::Destroyed);
        assert!(k.key_data().material().is_empty());
        assert_eq!(k.algorithm_id(), "toy");
    }
}
