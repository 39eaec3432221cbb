//! Key manager capability and its type-erased form held by the registry

use crate::{KeyMaterial, KeyParameters, KeyTemplate, Result, TesselError};
use std::any::{Any, TypeId};

/// A family of primitives with a common interface, such as deterministic AEAD.
///
/// `Instance` is the shared handle callers receive, typically `Arc<dyn Trait>`.
pub trait PrimitiveKind: Send + Sync + 'static {
    /// Callable primitive produced for this kind
    type Instance: Clone + Send + Sync + 'static;

    /// Human readable kind name used in errors and logs
    const NAME: &'static str;
}

/// Factory for one algorithm.
///
/// Implementations are stateless: every method may be called concurrently.
pub trait KeyManager: Send + Sync + 'static {
    /// Primitive kind this manager builds
    type Kind: PrimitiveKind;

    /// Algorithm identifier the manager answers for
    fn algorithm_id(&self) -> &str;

    /// Build a primitive from key material.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the material is malformed for the algorithm.
    fn new_primitive(
        &self,
        material: &KeyMaterial,
    ) -> Result<<Self::Kind as PrimitiveKind>::Instance>;

    /// Check generation parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the parameters are not supported.
    fn validate_parameters(&self, parameters: &KeyParameters) -> Result<()>;

    /// Generate fresh key material.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the parameters are not supported.
    fn new_key(&self, parameters: &KeyParameters) -> Result<KeyMaterial>;

    /// Templates this manager publishes by name
    fn named_templates(&self) -> Vec<(String, KeyTemplate)> {
        Vec::new()
    }
}

/// Object-safe view of a [`KeyManager`], as stored in the registry
pub trait AnyKeyManager: Send + Sync {
    /// Algorithm identifier
    fn algorithm_id(&self) -> &str;

    /// `TypeId` of the primitive kind served
    fn kind_id(&self) -> TypeId;

    /// Name of the primitive kind served
    fn kind_name(&self) -> &'static str;

    /// `TypeId` of the concrete manager type
    fn implementation_id(&self) -> TypeId;

    /// Type name of the concrete manager
    fn implementation_name(&self) -> &'static str;

    /// See [`KeyManager::validate_parameters`]
    ///
    /// # Errors
    ///
    /// Propagates the manager's validation error.
    fn validate_parameters(&self, parameters: &KeyParameters) -> Result<()>;

    /// See [`KeyManager::new_key`]
    ///
    /// # Errors
    ///
    /// Propagates the manager's generation error.
    fn new_key(&self, parameters: &KeyParameters) -> Result<KeyMaterial>;

    /// See [`KeyManager::named_templates`]
    fn named_templates(&self) -> Vec<(String, KeyTemplate)>;

    /// Build a primitive boxed as `Any`; the box holds the kind's `Instance`
    ///
    /// # Errors
    ///
    /// Propagates the manager's construction error.
    fn new_primitive_any(&self, material: &KeyMaterial) -> Result<Box<dyn Any + Send + Sync>>;
}

pub(crate) struct Erased<M>(pub(crate) M);

impl<M: KeyManager> AnyKeyManager for Erased<M> {
    fn algorithm_id(&self) -> &str {
        self.0.algorithm_id()
    }

    fn kind_id(&self) -> TypeId {
        TypeId::of::<M::Kind>()
    }

    fn kind_name(&self) -> &'static str {
        <M::Kind as PrimitiveKind>::NAME
    }

    fn implementation_id(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<M>()
    }

    fn validate_parameters(&self, parameters: &KeyParameters) -> Result<()> {
        self.0.validate_parameters(parameters)
    }

    fn new_key(&self, parameters: &KeyParameters) -> Result<KeyMaterial> {
        self.0.new_key(parameters)
    }

    fn named_templates(&self) -> Vec<(String, KeyTemplate)> {
        self.0.named_templates()
    }

    fn new_primitive_any(&self, material: &KeyMaterial) -> Result<Box<dyn Any + Send + Sync>> {
        let primitive = self.0.new_primitive(material)?;
        Ok(Box::new(primitive))
    }
}

/// Build a typed primitive through an erased manager.
///
/// # Errors
///
/// Returns `PrimitiveKindMismatch` if the manager serves another kind, or the
/// manager's own error if construction fails.
pub fn new_primitive_of<K: PrimitiveKind>(
    manager: &dyn AnyKeyManager,
    material: &KeyMaterial,
) -> Result<K::Instance> {
    let mismatch = || TesselError::PrimitiveKindMismatch {
        expected: K::NAME,
        actual: manager.kind_name(),
    };
    if manager.kind_id() != TypeId::of::<K>() {
        return Err(mismatch());
    }
    manager
        .new_primitive_any(material)?
        .downcast::<K::Instance>()
        .map(|boxed| *boxed)
        .map_err(|_| mismatch())
}
