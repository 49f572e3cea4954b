use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::di::container::Resolver;
use crate::di::error::Result;

/// Instances are stored as `Arc<dyn Any>` wrapping the capability's `Arc<T>`,
/// so unsized capabilities (`dyn Trait`) can be recovered by downcasting.
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

pub(crate) type ErasedFactory =
    Arc<dyn Fn(&mut Resolver<'_>) -> Result<ErasedInstance> + Send + Sync>;

/// Lifetime of instances produced for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceScope {
    /// One instance per container, built on first resolution.
    Singleton,
    /// A new instance on every resolution.
    Transient,
}

impl fmt::Display for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceScope::Singleton => write!(f, "singleton"),
            ServiceScope::Transient => write!(f, "transient"),
        }
    }
}

/// Identifier of a capability. Equality and hashing use the `TypeId` only;
/// the type name is carried for diagnostics.
#[derive(Clone, Copy)]
pub struct ServiceKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.type_name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Registration record for one capability.
///
/// The instance slot doubles as the construction lock for singletons: a
/// resolver holds it while the factory runs, so concurrent resolvers of the
/// same singleton wait instead of building a second copy.
pub struct ServiceDescriptor {
    key: ServiceKey,
    scope: ServiceScope,
    factory: Option<ErasedFactory>,
    instance: Mutex<Option<ErasedInstance>>,
}

impl ServiceDescriptor {
    pub(crate) fn with_factory(key: ServiceKey, scope: ServiceScope, factory: ErasedFactory) -> Self {
        Self {
            key,
            scope,
            factory: Some(factory),
            instance: Mutex::new(None),
        }
    }

    pub(crate) fn with_instance(key: ServiceKey, instance: ErasedInstance) -> Self {
        Self {
            key,
            scope: ServiceScope::Singleton,
            factory: None,
            instance: Mutex::new(Some(instance)),
        }
    }

    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn scope(&self) -> ServiceScope {
        self.scope
    }

    /// Whether the descriptor was created from a pre-built instance.
    pub fn is_pinned(&self) -> bool {
        self.factory.is_none()
    }

    pub(crate) fn factory(&self) -> Option<&ErasedFactory> {
        self.factory.as_ref()
    }

    pub(crate) fn slot(&self) -> MutexGuard<'_, Option<ErasedInstance>> {
        // A factory that panicked leaves the slot empty; the data is still consistent.
        self.instance.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("key", &self.key)
            .field("scope", &self.scope)
            .field("pinned", &self.is_pinned())
            .finish()
    }
}
