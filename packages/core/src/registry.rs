//! Process-wide registry of key managers, wrappers and named templates.
//!
//! The registry holds one immutable snapshot behind an [`ArcSwap`]. Readers
//! load the current snapshot without locking; writers serialize on a mutex,
//! copy the snapshot, apply their change and publish the copy in one store.
//! A reader therefore sees either the whole registration or none of it.

use crate::manager::{new_primitive_of, Erased};
use crate::{
    AnyKeyManager, KeyData, KeyManager, KeyTemplate, PrimitiveKind, PrimitiveSet, Result,
    TesselError,
};
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Turns a [`PrimitiveSet`] into a single primitive of the same kind
pub trait PrimitiveWrapper: Send + Sync + 'static {
    /// Primitive kind wrapped
    type Kind: PrimitiveKind;

    /// Wrap the set.
    ///
    /// # Errors
    ///
    /// Implementation specific; wrappers of well-formed sets normally succeed.
    fn wrap(
        &self,
        primitives: PrimitiveSet<Self::Kind>,
    ) -> Result<<Self::Kind as PrimitiveKind>::Instance>;
}

/// Shared handle to a registered wrapper of kind `K`
pub type SharedWrapper<K> = Arc<dyn PrimitiveWrapper<Kind = K>>;

#[derive(Clone)]
struct KeyManagerEntry {
    manager: Arc<dyn AnyKeyManager>,
    new_key_allowed: bool,
}

#[derive(Clone)]
struct WrapperEntry {
    // Holds a `SharedWrapper<K>` for the kind keyed in the map
    wrapper: Arc<dyn Any + Send + Sync>,
    implementation_id: TypeId,
    implementation_name: &'static str,
}

#[derive(Clone, Default)]
struct Snapshot {
    key_managers: HashMap<String, KeyManagerEntry>,
    wrappers: HashMap<TypeId, WrapperEntry>,
    templates: HashMap<String, KeyTemplate>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Registry of key managers (by algorithm id), wrappers (by primitive kind)
/// and key templates (by name)
pub struct Registry {
    state: ArcSwap<Snapshot>,
    writer: Mutex<()>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty, independent registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(Snapshot::default()),
            writer: Mutex::new(()),
        }
    }

    /// The process-wide registry.
    ///
    /// Empty until the first registration and never torn down.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Register a key manager that may generate new keys.
    ///
    /// # Errors
    ///
    /// See [`Registry::register_key_manager_with`].
    pub fn register_key_manager<M: KeyManager>(&self, manager: M, allow_overwrite: bool) -> Result<()> {
        self.register_key_manager_with(manager, true, allow_overwrite)
    }

    /// Register a key manager under its algorithm id.
    ///
    /// Re-registering the same manager type is a no-op that keeps the first
    /// instance; it may only narrow `new_key_allowed`. A manager first
    /// registered with `new_key_allowed == false` cannot be re-registered
    /// with generation allowed unless `allow_overwrite` is set. Overwriting
    /// drops the templates the replaced manager published.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if, without `allow_overwrite`:
    /// - a different manager type is registered for the algorithm id
    /// - key generation would be widened for an existing registration
    /// - a published template name is already bound to a different template
    pub fn register_key_manager_with<M: KeyManager>(
        &self,
        manager: M,
        new_key_allowed: bool,
        allow_overwrite: bool,
    ) -> Result<()> {
        let manager: Arc<dyn AnyKeyManager> = Arc::new(Erased(manager));
        let algorithm_id = manager.algorithm_id().to_string();
        let templates = manager.named_templates();

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.state.load_full();

        if let Some(existing) = current.key_managers.get(&algorithm_id) {
            if !allow_overwrite {
                if existing.manager.implementation_id() != manager.implementation_id() {
                    return Err(TesselError::conflict(format!(
                        "algorithm {algorithm_id} is already registered with {}, cannot register {}",
                        existing.manager.implementation_name(),
                        manager.implementation_name()
                    )));
                }
                if new_key_allowed && !existing.new_key_allowed {
                    return Err(TesselError::conflict(format!(
                        "algorithm {algorithm_id} was registered with key generation disabled"
                    )));
                }
                if new_key_allowed == existing.new_key_allowed {
                    return Ok(());
                }

                // Narrowing generation rights keeps the registered instance
                let mut next = (*current).clone();
                next.key_managers.insert(
                    algorithm_id.clone(),
                    KeyManagerEntry {
                        manager: Arc::clone(&existing.manager),
                        new_key_allowed: false,
                    },
                );
                self.state.store(Arc::new(next));
                debug!(algorithm = %algorithm_id, "Disallowed key generation");
                return Ok(());
            }
        }

        if !allow_overwrite {
            for (name, template) in &templates {
                if current.templates.get(name).is_some_and(|known| known != template) {
                    return Err(TesselError::conflict(format!(
                        "key template {name} is already registered"
                    )));
                }
            }
        }

        let mut next = (*current).clone();
        if current.key_managers.contains_key(&algorithm_id) {
            // Templates of the replaced manager go with it
            next.templates
                .retain(|_, template| template.algorithm_id() != algorithm_id);
        }
        next.key_managers.insert(
            algorithm_id.clone(),
            KeyManagerEntry {
                manager,
                new_key_allowed,
            },
        );
        next.templates.extend(templates);
        self.state.store(Arc::new(next));

        debug!(algorithm = %algorithm_id, new_key_allowed, "Registered key manager");
        Ok(())
    }

    /// Register the wrapper for its primitive kind.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a wrapper of a different type is registered for
    /// the kind and `allow_overwrite` is false.
    pub fn register_wrapper<W: PrimitiveWrapper>(&self, wrapper: W, allow_overwrite: bool) -> Result<()> {
        let kind = TypeId::of::<W::Kind>();
        let kind_name = <W::Kind as PrimitiveKind>::NAME;
        let implementation_id = TypeId::of::<W>();
        let implementation_name = std::any::type_name::<W>();

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.state.load_full();

        if let Some(existing) = current.wrappers.get(&kind) {
            if existing.implementation_id == implementation_id && !allow_overwrite {
                return Ok(());
            }
            if !allow_overwrite {
                return Err(TesselError::conflict(format!(
                    "{kind_name} wrapper is already registered as {}, cannot register {implementation_name}",
                    existing.implementation_name
                )));
            }
        }

        let shared: SharedWrapper<W::Kind> = Arc::new(wrapper);
        let mut next = (*current).clone();
        next.wrappers.insert(
            kind,
            WrapperEntry {
                wrapper: Arc::new(shared),
                implementation_id,
                implementation_name,
            },
        );
        self.state.store(Arc::new(next));

        info!(kind = kind_name, wrapper = implementation_name, "Registered primitive wrapper");
        Ok(())
    }

    /// Key manager for an algorithm id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing is registered for the id.
    pub fn key_manager(&self, algorithm_id: &str) -> Result<Arc<dyn AnyKeyManager>> {
        self.state
            .load()
            .key_managers
            .get(algorithm_id)
            .map(|entry| Arc::clone(&entry.manager))
            .ok_or_else(|| TesselError::not_found(format!("no key manager for {algorithm_id}")))
    }

    /// Whether key generation is permitted for an algorithm id
    #[must_use]
    pub fn new_key_allowed(&self, algorithm_id: &str) -> bool {
        self.state
            .load()
            .key_managers
            .get(algorithm_id)
            .is_some_and(|entry| entry.new_key_allowed)
    }

    /// Wrapper registered for primitive kind `K`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no wrapper is registered for the kind. Callers
    /// with a legacy entry point should fall back instead of failing.
    pub fn wrapper<K: PrimitiveKind>(&self) -> Result<SharedWrapper<K>> {
        let entry = self
            .state
            .load()
            .wrappers
            .get(&TypeId::of::<K>())
            .cloned()
            .ok_or_else(|| TesselError::not_found(format!("no wrapper for {}", K::NAME)))?;
        entry
            .wrapper
            .downcast::<SharedWrapper<K>>()
            .map(|shared| Arc::clone(&*shared))
            .map_err(|_| TesselError::not_found(format!("no wrapper for {}", K::NAME)))
    }

    /// Whether a wrapper is registered for kind `K`
    #[must_use]
    pub fn has_wrapper<K: PrimitiveKind>(&self) -> bool {
        self.state.load().wrappers.contains_key(&TypeId::of::<K>())
    }

    /// Template published under `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no registered manager published the name.
    pub fn key_template(&self, name: &str) -> Result<KeyTemplate> {
        self.state
            .load()
            .templates
            .get(name)
            .cloned()
            .ok_or_else(|| TesselError::not_found(format!("no key template named {name}")))
    }

    /// Generate key data for a template.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `UnsupportedAlgorithm` if the template's algorithm is not registered
    /// - `KeyGenerationNotAllowed` if the manager was registered without it
    /// - `InvalidKey` if the manager rejects the parameters
    pub fn new_key(&self, template: &KeyTemplate) -> Result<KeyData> {
        let algorithm_id = template.algorithm_id();
        let entry = self
            .state
            .load()
            .key_managers
            .get(algorithm_id)
            .cloned()
            .ok_or_else(|| TesselError::UnsupportedAlgorithm(algorithm_id.to_string()))?;
        if !entry.new_key_allowed {
            return Err(TesselError::KeyGenerationNotAllowed(algorithm_id.to_string()));
        }
        entry.manager.validate_parameters(template.parameters())?;
        let material = entry.manager.new_key(template.parameters())?;
        Ok(KeyData::new(algorithm_id, material))
    }

    /// Instantiate a primitive of kind `K` from key data.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `UnsupportedAlgorithm` if the algorithm is not registered
    /// - `PrimitiveKindMismatch` if its manager builds another kind
    /// - `InvalidKey` if the material is malformed
    pub fn new_primitive<K: PrimitiveKind>(&self, key_data: &KeyData) -> Result<K::Instance> {
        let manager = self
            .key_manager(key_data.algorithm_id())
            .map_err(|_| TesselError::UnsupportedAlgorithm(key_data.algorithm_id().to_string()))?;
        new_primitive_of::<K>(manager.as_ref(), key_data.material())
    }

    /// Wrap a primitive set into one primitive.
    ///
    /// With `direct` set, that wrapper is applied and the registry's wrapper
    /// table is never consulted; this is how legacy entry points keep working
    /// when nothing was registered for the kind. Without it, the registered
    /// wrapper is required.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `direct` is `None` and no wrapper is registered,
    /// or the wrapper's own error.
    pub fn wrap<K: PrimitiveKind>(
        &self,
        primitives: PrimitiveSet<K>,
        direct: Option<&dyn PrimitiveWrapper<Kind = K>>,
    ) -> Result<K::Instance> {
        match direct {
            Some(wrapper) => {
                debug!(kind = K::NAME, "Wrapping primitive set without registry lookup");
                wrapper.wrap(primitives)
            }
            None => self.wrapper::<K>()?.wrap(primitives),
        }
    }
}
