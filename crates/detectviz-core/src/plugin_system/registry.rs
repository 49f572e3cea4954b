use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::kernel::constants;
use crate::plugin_system::error::{PluginSystemError, Result};

/// Free-form per-plugin metadata.
pub type PluginMetadata = HashMap<String, Value>;

struct RegistryEntry {
    /// Holds the registered `Arc<V>`.
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

#[derive(Default)]
struct RegistryState {
    plugins: HashMap<String, RegistryEntry>,
    metadata: HashMap<String, PluginMetadata>,
}

/// Name-keyed store of constructed plugin instances and their metadata.
///
/// Independent of how instances were built. Reads share the lock, writes take
/// it exclusively, and metadata leaves the registry only as a copy.
pub struct PluginRegistry {
    state: RwLock<RegistryState>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        constants::REGISTRY_COMPONENT_NAME
    }

    /// Register an instance under a unique, non-empty name.
    ///
    /// Seeds metadata with `name`, `type` and `status = "registered"`. A
    /// duplicate name fails and leaves the existing entry untouched.
    pub async fn register<V>(&self, name: impl Into<String>, instance: Arc<V>) -> Result<()>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        self.register_with_type(name, instance, std::any::type_name::<V>())
            .await
    }

    /// Like [`register`](Self::register), but seeds the `type` metadata with
    /// `type_tag` instead of the registered type. Used when `V` is a trait
    /// object and the caller knows the concrete type behind it.
    pub async fn register_with_type<V>(
        &self,
        name: impl Into<String>,
        instance: Arc<V>,
        type_tag: &'static str,
    ) -> Result<()>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(PluginSystemError::EmptyName);
        }

        let mut state = self.state.write().await;
        if state.plugins.contains_key(&name) {
            return Err(PluginSystemError::AlreadyRegistered { name });
        }

        let type_name = std::any::type_name::<V>();
        state.plugins.insert(
            name.clone(),
            RegistryEntry {
                instance: Arc::new(instance),
                type_name,
            },
        );
        state.metadata.insert(
            name.clone(),
            HashMap::from([
                ("name".to_string(), Value::String(name.clone())),
                ("type".to_string(), Value::String(type_tag.to_string())),
                ("status".to_string(), Value::String("registered".to_string())),
            ]),
        );
        log::debug!("Registered plugin '{}' ({})", name, type_tag);
        Ok(())
    }

    /// Look up an instance by name, recovering the type it was registered as.
    pub async fn get<V>(&self, name: &str) -> Result<Arc<V>>
    where
        V: ?Sized + Send + Sync + 'static,
    {
        let state = self.state.read().await;
        let entry = state.plugins.get(name).ok_or_else(|| PluginSystemError::NotFound {
            name: name.to_string(),
        })?;
        entry
            .instance
            .downcast_ref::<Arc<V>>()
            .cloned()
            .ok_or_else(|| PluginSystemError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<V>(),
                actual: entry.type_name,
            })
    }

    /// Look up an instance without knowing its type. The returned value wraps
    /// the `Arc<V>` that was registered.
    pub async fn get_any(&self, name: &str) -> Result<Arc<dyn Any + Send + Sync>> {
        let state = self.state.read().await;
        state
            .plugins
            .get(name)
            .map(|entry| entry.instance.clone())
            .ok_or_else(|| PluginSystemError::NotFound {
                name: name.to_string(),
            })
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.state.read().await.plugins.contains_key(name)
    }

    /// All registered names, in no particular order.
    pub async fn list(&self) -> Vec<String> {
        self.state.read().await.plugins.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.plugins.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.plugins.is_empty()
    }

    /// A copy of the plugin's metadata.
    pub async fn get_metadata(&self, name: &str) -> Result<PluginMetadata> {
        let state = self.state.read().await;
        state
            .metadata
            .get(name)
            .cloned()
            .ok_or_else(|| PluginSystemError::NotFound {
                name: name.to_string(),
            })
    }

    /// Merge `updates` into the plugin's metadata; keys not mentioned are kept.
    pub async fn update_metadata(&self, name: &str, updates: PluginMetadata) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.plugins.contains_key(name) {
            return Err(PluginSystemError::NotFound {
                name: name.to_string(),
            });
        }
        state
            .metadata
            .entry(name.to_string())
            .or_default()
            .extend(updates);
        Ok(())
    }

    /// Convenience for the common single-key update.
    pub async fn set_status(&self, name: &str, status: &str) -> Result<()> {
        self.update_metadata(
            name,
            HashMap::from([("status".to_string(), Value::String(status.to_string()))]),
        )
        .await
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry").finish_non_exhaustive()
    }
}
