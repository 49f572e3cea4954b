use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::di::dependencies::{Dependencies, IntoInstance};
use crate::di::descriptor::{ErasedFactory, ErasedInstance, ServiceDescriptor, ServiceKey, ServiceScope};
use crate::di::error::{DiError, Result};
use crate::kernel::constants;

/// What happens when a capability is registered a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`DiError::AlreadyRegistered`] and keep the existing descriptor.
    #[default]
    Reject,
    /// Overwrite the existing descriptor, dropping any cached singleton.
    Replace,
}

/// Dependency injection container keyed by capability type.
pub struct Container {
    services: RwLock<HashMap<ServiceKey, Arc<ServiceDescriptor>>>,
    duplicate_policy: DuplicatePolicy,
}

impl Container {
    /// Create an empty container that rejects duplicate registrations.
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::default())
    }

    pub fn with_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
            duplicate_policy,
        }
    }

    pub fn name(&self) -> &'static str {
        constants::CONTAINER_COMPONENT_NAME
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Register a factory whose result is built once and then cached.
    pub fn register_singleton<T, D, R>(
        &self,
        factory: impl Fn(D) -> R + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        R: IntoInstance<T> + 'static,
    {
        self.register_factory::<T, D, R>(ServiceScope::Singleton, factory)
    }

    /// Register a factory that is invoked on every resolution.
    pub fn register_transient<T, D, R>(
        &self,
        factory: impl Fn(D) -> R + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        R: IntoInstance<T> + 'static,
    {
        self.register_factory::<T, D, R>(ServiceScope::Transient, factory)
    }

    /// Register an already-built instance as a pinned singleton.
    pub fn register_instance<T>(&self, instance: Arc<T>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let erased: ErasedInstance = Arc::new(instance);
        self.insert(ServiceDescriptor::with_instance(key, erased))
    }

    fn register_factory<T, D, R>(
        &self,
        scope: ServiceScope,
        factory: impl Fn(D) -> R + Send + Sync + 'static,
    ) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        R: IntoInstance<T> + 'static,
    {
        let key = ServiceKey::of::<T>();
        let erased: ErasedFactory = Arc::new(move |resolver: &mut Resolver<'_>| {
            let dependencies = D::resolve(resolver)?;
            let instance: Arc<T> = factory(dependencies)
                .into_instance()
                .map_err(|source| DiError::FactoryFailed {
                    service: key.type_name(),
                    source,
                })?;
            Ok(Arc::new(instance) as ErasedInstance)
        });
        log::debug!(
            "Registering {} service {} with {} dependencies",
            scope,
            key,
            D::keys().len()
        );
        self.insert(ServiceDescriptor::with_factory(key, scope, erased))
    }

    fn insert(&self, descriptor: ServiceDescriptor) -> Result<()> {
        let key = descriptor.key();
        let mut services = self.write_services();
        if services.contains_key(&key) {
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(DiError::AlreadyRegistered {
                        service: key.type_name(),
                    });
                }
                DuplicatePolicy::Replace => {
                    log::warn!("Replacing existing registration for {}", key);
                }
            }
        }
        services.insert(key, Arc::new(descriptor));
        Ok(())
    }

    /// Resolve a capability, constructing it and its dependencies as needed.
    pub fn resolve<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).resolve::<T>()
    }

    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.is_key_registered(&ServiceKey::of::<T>())
    }

    pub fn is_key_registered(&self, key: &ServiceKey) -> bool {
        self.read_services().contains_key(key)
    }

    /// Scope of a registered capability, if any.
    pub fn scope_of<T: ?Sized + 'static>(&self) -> Option<ServiceScope> {
        self.read_services()
            .get(&ServiceKey::of::<T>())
            .map(|descriptor| descriptor.scope())
    }

    pub fn get_registered_services(&self) -> Vec<ServiceKey> {
        self.read_services().keys().copied().collect()
    }

    /// Remove every registration and cached instance.
    pub fn clear(&self) {
        self.write_services().clear();
    }

    fn descriptor(&self, key: &ServiceKey) -> Result<Arc<ServiceDescriptor>> {
        self.read_services()
            .get(key)
            .cloned()
            .ok_or(DiError::NotRegistered {
                service: key.type_name(),
            })
    }

    fn read_services(&self) -> RwLockReadGuard<'_, HashMap<ServiceKey, Arc<ServiceDescriptor>>> {
        self.services.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_services(&self) -> RwLockWriteGuard<'_, HashMap<ServiceKey, Arc<ServiceDescriptor>>> {
        self.services.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.get_registered_services())
            .field("duplicate_policy", &self.duplicate_policy)
            .finish()
    }
}

/// One resolution in progress: the container plus the chain of capabilities
/// currently being constructed, outermost first.
pub struct Resolver<'c> {
    container: &'c Container,
    chain: Vec<ServiceKey>,
}

impl<'c> Resolver<'c> {
    fn new(container: &'c Container) -> Self {
        Self {
            container,
            chain: Vec::new(),
        }
    }

    pub fn resolve<T>(&mut self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<T>();
        let erased = self.resolve_key(key)?;
        erased
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(DiError::InstanceTypeMismatch {
                service: key.type_name(),
            })
    }

    /// Resolve the `index`-th declared dependency of the capability at the
    /// top of the chain, annotating any failure with that position.
    pub(crate) fn resolve_parameter<T>(&mut self, index: usize) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let requester = self.chain.last().copied();
        self.resolve::<T>().map_err(|source| match requester {
            Some(service) => DiError::DependencyResolution {
                service: service.type_name(),
                index,
                parameter: std::any::type_name::<T>(),
                source: Box::new(source),
            },
            None => source,
        })
    }

    fn resolve_key(&mut self, key: ServiceKey) -> Result<ErasedInstance> {
        let descriptor = self.container.descriptor(&key)?;

        // Checked before touching the singleton slot: re-entering a slot we
        // already hold would deadlock.
        if self.chain.contains(&key) {
            let mut chain: Vec<&'static str> = self.chain.iter().map(ServiceKey::type_name).collect();
            chain.push(key.type_name());
            return Err(DiError::CyclicDependency { chain });
        }

        match descriptor.scope() {
            ServiceScope::Singleton => {
                let mut slot = descriptor.slot();
                if let Some(instance) = slot.as_ref() {
                    return Ok(instance.clone());
                }
                let instance = self.construct(&descriptor)?;
                *slot = Some(instance.clone());
                log::debug!("Cached singleton instance of {}", key);
                Ok(instance)
            }
            ServiceScope::Transient => self.construct(&descriptor),
        }
    }

    fn construct(&mut self, descriptor: &ServiceDescriptor) -> Result<ErasedInstance> {
        let key = descriptor.key();
        let factory = descriptor.factory().ok_or(DiError::NotRegistered {
            service: key.type_name(),
        })?;
        self.chain.push(key);
        let built = factory(&mut *self);
        self.chain.pop();
        built
    }
}
