//! # Tessel Core
//!
//! Algorithm-agnostic access to cryptographic primitives through keysets.
//!
//! ## Features
//!
//! - **Registry**: process-wide map of key managers, wrappers and templates
//! - **Keysets**: ordered keys with one primary, for rotation without downtime
//! - **Primitive sets**: every enabled key resolved into a ready primitive
//! - **Wrappers**: one callable primitive over a whole keyset
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
//! let ciphertext = daead.encrypt_deterministically(b"plaintext", b"associated data")?;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod keyset;
pub mod keyset_manager;
pub mod manager;
pub mod material;
pub mod primitive_set;
pub mod registry;
pub mod template;

// Re-export core types
pub use error::{Result, TesselError};
pub use handle::KeysetHandle;
pub use keyset::{
    Key, KeyId, KeyInfo, KeyStatus, Keyset, KeysetInfo, OutputPrefixType, STANDARD_PREFIX_SIZE,
    STANDARD_START_BYTE,
};
pub use keyset_manager::KeysetManager;
pub use manager::{new_primitive_of, AnyKeyManager, KeyManager, PrimitiveKind};
pub use material::{KeyData, KeyMaterial};
pub use primitive_set::{Entry, PrimitiveSet};
pub use registry::{PrimitiveWrapper, Registry, SharedWrapper};
pub use template::{KeyParameters, KeyTemplate, KeyTemplates};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        KeyManager, KeyStatus, KeyTemplate, KeyTemplates, KeysetHandle, KeysetManager,
        OutputPrefixType, PrimitiveKind, PrimitiveSet, PrimitiveWrapper, Registry, Result,
        TesselError,
    };
}
