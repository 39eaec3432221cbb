//! Error handling for keyset resolution and primitive construction

use thiserror::Error;

/// Errors raised by the registry, keysets and the primitives built from them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TesselError {
    /// No key manager is registered for the requested algorithm
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A different implementation is already registered under the same identifier
    #[error("Registration conflict: {0}")]
    Conflict(String),

    /// Key material or key parameters are malformed for the algorithm
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The keyset violates a structural invariant
    #[error("Invalid keyset: {0}")]
    InvalidKeyset(String),

    /// No candidate key could decrypt the ciphertext.
    ///
    /// Carries no detail about which keys or prefixes were tried.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// The underlying primitive refused to encrypt
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Lookup of a key manager, wrapper or template failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// The key manager was registered with key generation disabled
    #[error("Key generation not allowed for {0}")]
    KeyGenerationNotAllowed(String),

    /// A key manager produced a primitive of another kind than requested
    #[error("Primitive kind mismatch: expected {expected}, got {actual}")]
    PrimitiveKindMismatch {
        /// Kind the caller asked for
        expected: &'static str,
        /// Kind the key manager serves
        actual: &'static str,
    },
}

impl TesselError {
    /// Create an `InvalidKey` error
    pub fn invalid_key(msg: impl Into<String>) -> Self {
        Self::InvalidKey(msg.into())
    }

    /// Create an `InvalidKeyset` error
    pub fn invalid_keyset(msg: impl Into<String>) -> Self {
        Self::InvalidKeyset(msg.into())
    }

    /// Create a `Conflict` error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a `NotFound` error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an `EncryptionFailed` error
    pub fn encryption_failed(msg: impl Into<String>) -> Self {
        Self::EncryptionFailed(msg.into())
    }
}

/// Result type for tessel operations
pub type Result<T> = std::result::Result<T, TesselError>;
