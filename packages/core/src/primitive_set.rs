//! Resolved primitives of a keyset, indexed by output prefix

use crate::{
    KeyId, KeyStatus, KeysetHandle, OutputPrefixType, PrimitiveKind, Registry, Result,
    TesselError, STANDARD_PREFIX_SIZE,
};
use std::collections::HashMap;
use tracing::debug;

/// One enabled key of a keyset with its instantiated primitive
pub struct Entry<K: PrimitiveKind> {
    primitive: K::Instance,
    key_id: KeyId,
    status: KeyStatus,
    output_prefix: OutputPrefixType,
    identifier: Vec<u8>,
}

impl<K: PrimitiveKind> Clone for Entry<K> {
    fn clone(&self) -> Self {
        Self {
            primitive: self.primitive.clone(),
            key_id: self.key_id,
            status: self.status,
            output_prefix: self.output_prefix,
            identifier: self.identifier.clone(),
        }
    }
}

impl<K: PrimitiveKind> Entry<K> {
    /// The instantiated primitive
    pub fn primitive(&self) -> &K::Instance {
        &self.primitive
    }

    /// Id of the key behind the primitive
    pub fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Status of the key when the set was built
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// Output prefix style of the key
    pub fn output_prefix(&self) -> OutputPrefixType {
        self.output_prefix
    }

    /// Prefix bytes this key puts in front of its ciphertexts
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }
}

/// Immutable set of primitives built from the enabled keys of a keyset.
///
/// Entries sharing a prefix keep keyset order. Exactly one entry is primary.
pub struct PrimitiveSet<K: PrimitiveKind> {
    by_prefix: HashMap<Vec<u8>, Vec<Entry<K>>>,
    ordered: Vec<Entry<K>>,
    primary: Entry<K>,
}

impl<K: PrimitiveKind> PrimitiveSet<K> {
    /// Resolve every enabled key of `handle` through `registry`.
    ///
    /// Disabled and destroyed keys are skipped entirely.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `UnsupportedAlgorithm` if a key's algorithm is not registered
    /// - `PrimitiveKindMismatch` if a key belongs to another primitive kind
    /// - `InvalidKey` if a key manager rejects the material
    /// - `InvalidKeyset` if the primary key is not among the enabled keys
    pub fn build(handle: &KeysetHandle, registry: &Registry) -> Result<Self> {
        let keyset = handle.keyset();
        let mut by_prefix: HashMap<Vec<u8>, Vec<Entry<K>>> = HashMap::new();
        let mut ordered = Vec::with_capacity(keyset.keys().len());
        let mut primary = None;

        for key in keyset
            .keys()
            .iter()
            .filter(|key| key.status() == KeyStatus::Enabled)
        {
            let entry = Entry {
                primitive: registry.new_primitive::<K>(key.key_data())?,
                key_id: key.key_id(),
                status: key.status(),
                output_prefix: key.output_prefix(),
                identifier: key.output_prefix_bytes(),
            };
            if key.key_id() == keyset.primary_key_id() {
                primary = Some(entry.clone());
            }
            by_prefix
                .entry(entry.identifier.clone())
                .or_default()
                .push(entry.clone());
            ordered.push(entry);
        }

        let primary = primary.ok_or_else(|| {
            TesselError::invalid_keyset(format!(
                "primary key {} is not an enabled key",
                keyset.primary_key_id()
            ))
        })?;

        debug!(kind = K::NAME, keys = ordered.len(), "Built primitive set");
        Ok(Self {
            by_prefix,
            ordered,
            primary,
        })
    }

    /// The entry used for encryption
    pub fn primary(&self) -> &Entry<K> {
        &self.primary
    }

    /// All entries in keyset order
    pub fn entries(&self) -> &[Entry<K>] {
        &self.ordered
    }

    /// Entries whose output prefix equals `prefix`, in keyset order
    pub fn entries_for_prefix(&self, prefix: &[u8]) -> &[Entry<K>] {
        self.by_prefix.get(prefix).map(Vec::as_slice).unwrap_or_default()
    }

    /// Entries of raw-prefix keys, in keyset order
    pub fn raw_entries(&self) -> &[Entry<K>] {
        self.entries_for_prefix(&[])
    }

    /// Candidate `(entry, payload)` pairs for decrypting `ciphertext`.
    ///
    /// Keys whose standard prefix matches the first bytes come first, paired
    /// with the ciphertext minus the prefix; raw keys follow, paired with the
    /// whole ciphertext. Within each group keyset order is kept.
    pub fn decryption_candidates<'a>(
        &'a self,
        ciphertext: &'a [u8],
    ) -> impl Iterator<Item = (&'a Entry<K>, &'a [u8])> + 'a {
        let prefixed = ciphertext
            .get(..STANDARD_PREFIX_SIZE)
            .map(|prefix| self.entries_for_prefix(prefix))
            .unwrap_or_default()
            .iter()
            .map(move |entry| (entry, &ciphertext[STANDARD_PREFIX_SIZE..]));
        let raw = self.raw_entries().iter().map(move |entry| (entry, ciphertext));
        prefixed.chain(raw)
    }
}
