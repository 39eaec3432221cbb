//! # Tessel Deterministic AEAD
//!
//! Deterministic authenticated encryption over keysets.
//!
//! ## Features
//!
//! - **AES-SIV**: 512-bit AES-SIV key manager (`aes-siv` feature, on by default)
//! - **Key rotation**: encrypt with the primary key, decrypt with any enabled key
//! - **Two entry points**: the registered wrapper via
//!   `KeysetHandle::primitive`, and the legacy [`DeterministicAeadFactory`]
//!   which needs no wrapper registration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessel_core::{KeysetHandle, KeyTemplates};
//! use tessel_daead::{DeterministicAeadConfig, DeterministicAeadKind};
//!
//! DeterministicAeadConfig::register()?;
//! let handle = KeysetHandle::generate_new(&KeyTemplates::get("AES256_SIV")?)?;
//! let daead = handle.primitive::<DeterministicAeadKind>()?;
//!
//! let ciphertext = daead.encrypt_deterministically(b"plaintext", b"associatedData")?;
//! assert_eq!(daead.decrypt_deterministically(&ciphertext, b"associatedData")?, b"plaintext");
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(feature = "aes-siv")]
pub mod siv;
pub mod config;
pub mod factory;
pub mod primitive;
pub mod wrapper;

#[cfg(feature = "aes-siv")]
pub use siv::{AesSiv, AesSivKeyManager, AES_SIV_ALGORITHM_ID, AES_SIV_KEY_SIZE};
pub use config::DeterministicAeadConfig;
pub use factory::DeterministicAeadFactory;
pub use primitive::{DeterministicAead, DeterministicAeadKind};
pub use wrapper::{DeterministicAeadWrapper, WrappedDeterministicAead};

/// Prelude module for convenient imports
pub mod prelude {
    #[cfg(feature = "aes-siv")]
    pub use crate::AesSivKeyManager;
    pub use crate::{
        DeterministicAead, DeterministicAeadConfig, DeterministicAeadKind, DeterministicAeadWrapper,
    };
}
