//! Opaque key material

use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

/// Secret key bytes, wiped from memory on drop.
///
/// `Debug` never prints the bytes. Only key managers should call
/// [`KeyMaterial::expose_secret`].
#[derive(Clone, Default)]
pub struct KeyMaterial(Zeroizing<Vec<u8>>);

impl KeyMaterial {
    /// Take ownership of raw key bytes
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Copy key bytes out of a slice
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    /// Fill `len` bytes from the thread-local CSPRNG
    #[must_use]
    pub fn random(len: usize) -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Length of the key in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the material has been wiped or was never set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the secret bytes
    #[must_use]
    pub fn expose_secret(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED; {} bytes])", self.0.len())
    }
}

/// Key material tagged with the algorithm that understands it
#[derive(Clone, Debug)]
pub struct KeyData {
    algorithm_id: String,
    material: KeyMaterial,
}

impl KeyData {
    /// Bind material to an algorithm identifier
    pub fn new(algorithm_id: impl Into<String>, material: KeyMaterial) -> Self {
        Self {
            algorithm_id: algorithm_id.into(),
            material,
        }
    }

    /// Algorithm identifier used to look up the key manager
    #[must_use]
    pub fn algorithm_id(&self) -> &str {
        &self.algorithm_id
    }

    /// The secret material
    #[must_use]
    pub fn material(&self) -> &KeyMaterial {
        &self.material
    }

    /// Drop the secret, leaving only the algorithm identifier
    pub(crate) fn wipe(&mut self) {
        self.material = KeyMaterial::default();
    }
}
