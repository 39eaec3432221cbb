//! One-call registration of the deterministic AEAD family

use crate::DeterministicAeadWrapper;
#[cfg(feature = "aes-siv")]
use crate::AesSivKeyManager;
use tessel_core::{Registry, Result};
use tracing::info;

/// Registers every deterministic AEAD key manager compiled in, plus the wrapper
pub struct DeterministicAeadConfig;

impl DeterministicAeadConfig {
    /// Register with the global registry. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a different implementation already owns one of
    /// the algorithm ids or the wrapper slot.
    pub fn register() -> Result<()> {
        Self::register_in(Registry::global())
    }

    /// Register with `registry`.
    ///
    /// # Errors
    ///
    /// See [`DeterministicAeadConfig::register`].
    pub fn register_in(registry: &Registry) -> Result<()> {
        #[cfg(feature = "aes-siv")]
        registry.register_key_manager(AesSivKeyManager, false)?;
        registry.register_wrapper(DeterministicAeadWrapper, false)?;
        info!("Deterministic AEAD configuration registered");
        Ok(())
    }
}
