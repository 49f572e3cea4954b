use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConfigData;
use crate::health::HealthCheck;
use crate::plugin_system::error::Result;

/// Configuration handed to [`Plugin::init`].
pub type PluginConfig = ConfigData;

/// Core trait that all managed components implement.
///
/// Methods take `&self`; implementations keep their state behind interior
/// mutability (see [`LifecycleState`](crate::plugin_system::LifecycleState)).
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable identifier used for logging. Not necessarily the registry key.
    fn name(&self) -> &str;

    /// Concrete type of the implementation, resolved through the vtable when
    /// called on a trait object.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Validate and absorb configuration. Must tolerate being called again
    /// before `start`.
    async fn init(&self, config: &PluginConfig) -> Result<()>;

    /// Begin background behaviour. Fails with
    /// [`PluginSystemError::NotInitialized`](crate::plugin_system::error::PluginSystemError::NotInitialized)
    /// when `init` has not succeeded.
    async fn start(&self) -> Result<()>;

    /// Release resources. Safe to call when never started.
    async fn stop(&self) -> Result<()>;

    /// Expose the optional health-check capability.
    ///
    /// Health-checkable plugins override this to return `Some(self)`.
    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthCheck>> {
        None
    }
}
