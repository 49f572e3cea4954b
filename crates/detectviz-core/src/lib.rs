// Runtime modules
pub mod config;
pub mod di;
pub mod health;
pub mod kernel;
pub mod plugin_system;

// Re-export key public types/traits for easier use by the binary and plugins
pub use kernel::Platform;
pub use kernel::error::Error as KernelError;
pub use di::{Container, ServiceKey, ServiceScope};
pub use plugin_system::{Plugin, PluginConfig, PluginRegistry, PluginState};
pub use health::{HealthCheck, HealthCheckManager, HealthCheckResult, HealthStatus};
pub use config::RuntimeConfig;

// Re-exported so plugin crates can take a cancellation token without
// depending on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
