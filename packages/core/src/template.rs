//! Key templates: what to generate, without the material

use crate::{OutputPrefixType, Registry, Result};
use serde::{Deserialize, Serialize};

/// Algorithm-specific generation parameters
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyParameters {
    /// Key size in bytes
    pub key_size: usize,
}

impl KeyParameters {
    /// Parameters for a key of `key_size` bytes
    #[must_use]
    pub fn with_key_size(key_size: usize) -> Self {
        Self { key_size }
    }
}

/// Recipe for generating a new key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTemplate {
    algorithm_id: String,
    parameters: KeyParameters,
    output_prefix: OutputPrefixType,
}

impl KeyTemplate {
    /// Create a template
    pub fn new(
        algorithm_id: impl Into<String>,
        parameters: KeyParameters,
        output_prefix: OutputPrefixType,
    ) -> Self {
        Self {
            algorithm_id: algorithm_id.into(),
            parameters,
            output_prefix,
        }
    }

    /// Algorithm the generated key belongs to
    #[must_use]
    pub fn algorithm_id(&self) -> &str {
        &self.algorithm_id
    }

    /// Generation parameters
    #[must_use]
    pub fn parameters(&self) -> &KeyParameters {
        &self.parameters
    }

    /// Output prefix style of the generated key
    #[must_use]
    pub fn output_prefix(&self) -> OutputPrefixType {
        self.output_prefix
    }

    /// Same template with another prefix style
    #[must_use]
    pub fn with_output_prefix(mut self, output_prefix: OutputPrefixType) -> Self {
        self.output_prefix = output_prefix;
        self
    }
}

/// Named templates published by registered key managers
pub struct KeyTemplates;

impl KeyTemplates {
    /// Look up a template by name in the global registry, e.g. `"AES256_SIV"`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no registered key manager published the name.
    pub fn get(name: &str) -> Result<KeyTemplate> {
        Registry::global().key_template(name)
    }
}
